use crate::consts::IMAGE_TAG_LEN;
use std::fmt;
use uuid::Uuid;

/// Fully qualified image a function's build pushes and its revision runs.
/// `<registry>/<namespace>-<name>:<tag>`
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ImageReference {
    repository: String,
    tag: String,
}

impl ImageReference {
    pub fn repository(registry: &str, namespace: &str, name: &str) -> String {
        format!("{registry}/{namespace}-{name}")
    }

    /// A reference with a fresh random tag
    pub fn generate(registry: &str, namespace: &str, name: &str) -> Self {
        Self {
            repository: Self::repository(registry, namespace, name),
            tag: random_tag(),
        }
    }

    /// Reuses the tag of `image` if it points into the same repository.
    pub fn reuse(registry: &str, namespace: &str, name: &str, image: &str) -> Option<Self> {
        let repository = Self::repository(registry, namespace, name);

        let tag = image
            .strip_prefix(repository.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
            .filter(|tag| !tag.is_empty() && !tag.contains([':', '/']))?
            .to_string();

        Some(Self { repository, tag })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

fn random_tag() -> String {
    Uuid::new_v4().simple().to_string()[..IMAGE_TAG_LEN].to_string()
}
