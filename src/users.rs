// src/users.rs
use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

/// Lookup seam for user skill profiles. Profile management, auth and skill
/// extraction live outside this crate; the pipeline only ever reads.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn skills_for(&self, user_id: &str) -> Option<Vec<String>>;

    /// Deduplicated union of skills across all users, in first-seen order.
    async fn all_skills(&self) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    inner: Mutex<Vec<UserProfile>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, id: &str, skills: Vec<String>) {
        let mut v = self.inner.lock().expect("user directory mutex poisoned");
        match v.iter_mut().find(|u| u.id == id) {
            Some(user) => user.skills = skills,
            None => v.push(UserProfile {
                id: id.to_string(),
                skills,
            }),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn skills_for(&self, user_id: &str) -> Option<Vec<String>> {
        let v = self.inner.lock().expect("user directory mutex poisoned");
        v.iter().find(|u| u.id == user_id).map(|u| u.skills.clone())
    }

    async fn all_skills(&self) -> Vec<String> {
        let v = self.inner.lock().expect("user directory mutex poisoned");
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for user in v.iter() {
            for skill in &user.skills {
                if seen.insert(skill.clone()) {
                    out.push(skill.clone());
                }
            }
        }
        out
    }
}
