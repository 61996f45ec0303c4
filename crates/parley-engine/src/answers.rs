//! Renders classified intents into answer text from profile content.

use parley_core::{ExtractedEntity, Reply, ReplyKind, UiCommand};
use parley_context::UserProfile;
use parley_nlu::EntityRelationship;
use parley_profile::{Profile, Role};

/// All answerable topics, in suggestion-ring order.
pub const TOPICS: &[&str] = &[
    "experience",
    "skills",
    "projects",
    "education",
    "contact",
    "about",
];

/// Renders an intent to answer text and UI commands, consulting the
/// extracted entities for a narrower answer where one applies. `None`
/// for intents the catalog does not cover.
pub fn render(intent: &str, profile: &Profile, entities: &[ExtractedEntity]) -> Option<Reply> {
    let text_and_commands = match intent {
        "experience" => Some(render_experience(profile, entities)),
        "skills" => Some(render_skills(profile, entities)),
        "education" => Some(render_education(profile)),
        "contact" => Some(render_contact(profile)),
        "projects" => Some(render_projects(profile)),
        "about" => Some(render_about(profile)),
        _ => None,
    }?;
    let (text, commands) = text_and_commands;
    let mut reply = Reply::plain(text, ReplyKind::Answer);
    reply.intent = Some(intent.to_string());
    reply.commands = commands;
    Some(reply)
}

fn describe_role(role: &Role) -> String {
    let span = match &role.end {
        Some(end) => format!("{} to {}", role.start, end),
        None => format!("since {}", role.start),
    };
    let mut text = format!("{} at {} ({})", role.title, role.company, span);
    if let Some(highlight) = role.highlights.first() {
        text.push_str(&format!(". {}", highlight));
    }
    if !role.technologies.is_empty() {
        text.push_str(&format!(" Tech: {}.", role.technologies.join(", ")));
    }
    text
}

fn render_experience(profile: &Profile, entities: &[ExtractedEntity]) -> (String, Vec<UiCommand>) {
    let company_entity = entities.iter().find(|e| e.entity_type == "company");
    let role = company_entity
        .and_then(|e| profile.role_by_company(&e.value))
        .or_else(|| profile.latest_role());

    let text = match role {
        Some(role) => format!("{} {}", intro(profile), describe_role(role)),
        None => format!("{} No work history is on file yet.", intro(profile)),
    };
    (text, Vec::new())
}

fn render_skills(profile: &Profile, entities: &[ExtractedEntity]) -> (String, Vec<UiCommand>) {
    if let Some(skill_entity) = entities.iter().find(|e| e.entity_type == "skill") {
        if let Some(skill) = profile
            .skills
            .iter()
            .flat_map(|g| &g.competencies)
            .find(|s| s.name.eq_ignore_ascii_case(&skill_entity.value))
        {
            let level = if skill.level.is_empty() {
                String::new()
            } else {
                format!(" ({})", skill.level)
            };
            return (
                format!("Yes — {}{} is part of the toolkit.", skill.name, level),
                Vec::new(),
            );
        }
    }

    let categories: Vec<String> = profile
        .skills
        .iter()
        .map(|group| {
            let names: Vec<&str> = group
                .competencies
                .iter()
                .take(3)
                .map(|s| s.name.as_str())
                .collect();
            format!("{}: {}", group.category, names.join(", "))
        })
        .collect();
    let text = if categories.is_empty() {
        "No skills are on file yet.".to_string()
    } else {
        format!("The skill set covers {}.", categories.join("; "))
    };
    (text, Vec::new())
}

fn render_education(profile: &Profile) -> (String, Vec<UiCommand>) {
    let entries: Vec<String> = profile
        .education
        .iter()
        .map(|school| {
            if school.field.is_empty() {
                format!("{} at {}", school.degree, school.institution)
            } else {
                format!("{} in {} at {}", school.degree, school.field, school.institution)
            }
        })
        .collect();
    let text = if entries.is_empty() {
        "No formal education is listed.".to_string()
    } else {
        format!("Education: {}.", entries.join("; "))
    };
    (text, Vec::new())
}

fn render_contact(profile: &Profile) -> (String, Vec<UiCommand>) {
    let mut text = format!("You can reach out at {}", profile.contact.email);
    if !profile.contact.location.is_empty() {
        text.push_str(&format!(" (based in {})", profile.contact.location));
    }
    text.push_str(". Scrolling you to the contact section.");
    (
        text,
        vec![UiCommand::Scroll {
            target: "contact".to_string(),
        }],
    )
}

fn render_projects(profile: &Profile) -> (String, Vec<UiCommand>) {
    let highlights: Vec<&str> = profile
        .experience
        .iter()
        .flat_map(|role| role.highlights.iter())
        .take(3)
        .map(String::as_str)
        .collect();
    let text = if highlights.is_empty() {
        "No project highlights are on file yet.".to_string()
    } else {
        format!("A few highlights: {}.", highlights.join("; "))
    };
    (text, Vec::new())
}

fn render_about(profile: &Profile) -> (String, Vec<UiCommand>) {
    let person = &profile.person;
    let text = if person.summary.is_empty() {
        format!("{} — {}.", person.name, person.title)
    } else {
        format!("{} — {}. {}", person.name, person.title, person.summary)
    };
    (text, Vec::new())
}

fn intro(profile: &Profile) -> String {
    format!("Here's {}'s most relevant experience:", profile.person.name)
}

/// Answers a compound skill-at-company question from the relationship
/// descriptor.
pub fn render_relationship(rel: &EntityRelationship, profile: &Profile) -> Option<Reply> {
    let role = profile.role_by_company(&rel.second.value)?;
    let skill = &rel.first.value;
    let used = role
        .technologies
        .iter()
        .any(|t| t.eq_ignore_ascii_case(skill));
    let text = if used {
        format!(
            "Yes — {} was part of the stack at {} ({}).",
            skill, role.company, role.title
        )
    } else {
        format!(
            "{} isn't listed for the time at {}, where the stack was {}.",
            skill,
            role.company,
            role.technologies.join(", ")
        )
    };
    let mut reply = Reply::plain(text, ReplyKind::Answer);
    reply.intent = Some("experience".to_string());
    Some(reply)
}

/// Follow-up chips for an answered intent: the other topics, least
/// explored first, never the current intent.
pub fn suggestions_for(intent: Option<&str>, user_profile: &UserProfile, max: usize) -> Vec<String> {
    let candidates: Vec<&str> = TOPICS
        .iter()
        .copied()
        .filter(|t| Some(*t) != intent)
        .collect();
    user_profile
        .least_explored(&candidates)
        .into_iter()
        .take(max)
        .map(str::to_string)
        .collect()
}
