use serde::{Deserialize, Serialize};

/// The person the site is about.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

/// Contact details surfaced by the contact intent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub links: Vec<String>,
}

/// One position in the work history.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Role {
    pub company: String,
    pub title: String,
    /// `YYYY-MM`.
    pub start: String,
    /// `YYYY-MM`, absent for the current role.
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

impl Role {
    /// Open-ended roles sort ahead of everything closed.
    pub fn is_current(&self) -> bool {
        self.end.is_none()
    }
}

/// A single named skill with a freeform proficiency label.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub level: String,
}

/// A category of skills ("Languages", "Infrastructure", ...).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    #[serde(default)]
    pub competencies: Vec<Skill>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct School {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub year: String,
}

/// The whole profile document. Loaded once, read-only afterwards.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Profile {
    pub person: Person,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub experience: Vec<Role>,
    #[serde(default)]
    pub skills: Vec<SkillGroup>,
    #[serde(default)]
    pub education: Vec<School>,
}

impl Profile {
    /// Case-insensitive lookup of a role by company name.
    pub fn role_by_company(&self, name: &str) -> Option<&Role> {
        let name = name.trim().to_lowercase();
        self.experience
            .iter()
            .find(|r| r.company.to_lowercase() == name)
    }

    /// Most recent role: current roles first, then by start date
    /// descending. `YYYY-MM` strings compare correctly lexically.
    pub fn latest_role(&self) -> Option<&Role> {
        let mut roles: Vec<&Role> = self.experience.iter().collect();
        roles.sort_by(|a, b| {
            b.is_current()
                .cmp(&a.is_current())
                .then_with(|| b.start.cmp(&a.start))
        });
        roles.into_iter().next()
    }

    /// Up to `n` roles, most recent first.
    pub fn top_roles(&self, n: usize) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.experience.iter().collect();
        roles.sort_by(|a, b| {
            b.is_current()
                .cmp(&a.is_current())
                .then_with(|| b.start.cmp(&a.start))
        });
        roles.truncate(n);
        roles
    }

    /// Flat list of every skill name across categories.
    pub fn skill_names(&self) -> Vec<String> {
        self.skills
            .iter()
            .flat_map(|g| g.competencies.iter().map(|s| s.name.clone()))
            .collect()
    }

    /// Case-insensitive skill membership check.
    pub fn has_skill(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.skills
            .iter()
            .flat_map(|g| &g.competencies)
            .any(|s| s.name.to_lowercase() == name)
    }

    pub fn company_names(&self) -> Vec<String> {
        self.experience.iter().map(|r| r.company.clone()).collect()
    }
}

#[cfg(test)]
pub(crate) fn sample_profile() -> Profile {
    Profile {
        person: Person {
            name: "Ada Calder".to_string(),
            title: "Platform Engineer".to_string(),
            summary: "Builds distributed systems.".to_string(),
        },
        contact: Contact {
            email: "ada@example.com".to_string(),
            location: "Berlin".to_string(),
            links: vec!["https://example.com".to_string()],
        },
        experience: vec![
            Role {
                company: "Acme".to_string(),
                title: "Senior Platform Engineer".to_string(),
                start: "2022-03".to_string(),
                end: None,
                highlights: vec!["Led the migration to Kubernetes".to_string()],
                technologies: vec!["rust".to_string(), "kubernetes".to_string()],
            },
            Role {
                company: "Globex".to_string(),
                title: "Backend Engineer".to_string(),
                start: "2019-06".to_string(),
                end: Some("2022-02".to_string()),
                highlights: vec!["Built the billing pipeline".to_string()],
                technologies: vec!["python".to_string(), "postgres".to_string()],
            },
        ],
        skills: vec![SkillGroup {
            category: "Languages".to_string(),
            competencies: vec![
                Skill {
                    name: "Rust".to_string(),
                    level: "expert".to_string(),
                },
                Skill {
                    name: "Python".to_string(),
                    level: "advanced".to_string(),
                },
            ],
        }],
        education: vec![School {
            institution: "TU Berlin".to_string(),
            degree: "BSc".to_string(),
            field: "Computer Science".to_string(),
            year: "2019".to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_by_company_case_insensitive() {
        let p = sample_profile();
        assert!(p.role_by_company("ACME").is_some());
        assert!(p.role_by_company("  acme ").is_some());
        assert!(p.role_by_company("initech").is_none());
    }

    #[test]
    fn test_latest_role_prefers_current() {
        let p = sample_profile();
        assert_eq!(p.latest_role().unwrap().company, "Acme");
    }

    #[test]
    fn test_latest_role_by_start_when_all_closed() {
        let mut p = sample_profile();
        p.experience[0].end = Some("2024-01".to_string());
        assert_eq!(p.latest_role().unwrap().company, "Acme");
        p.experience[0].start = "2018-01".to_string();
        assert_eq!(p.latest_role().unwrap().company, "Globex");
    }

    #[test]
    fn test_top_roles_truncates() {
        let p = sample_profile();
        assert_eq!(p.top_roles(1).len(), 1);
        assert_eq!(p.top_roles(10).len(), 2);
    }

    #[test]
    fn test_skill_accessors() {
        let p = sample_profile();
        assert_eq!(p.skill_names(), vec!["Rust", "Python"]);
        assert!(p.has_skill("rust"));
        assert!(!p.has_skill("go"));
    }

    #[test]
    fn test_empty_profile_accessors() {
        let p = Profile::default();
        assert!(p.latest_role().is_none());
        assert!(p.skill_names().is_empty());
        assert!(p.company_names().is_empty());
    }
}
