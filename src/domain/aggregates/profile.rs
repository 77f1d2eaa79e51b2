//! User profile document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::UserId;

pub const AVATARS: [&str; 6] = ["avatar-default", "avatar-m1", "avatar-m2", "avatar-f1", "avatar-f2", "avatar-f3"];

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Avatar(&'static str);

impl<'de> Deserialize<'de> for Avatar {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl Avatar {
    pub fn parse(value: &str) -> Result<Self, UnknownAvatar> {
        AVATARS.iter().find(|a| **a == value).map(|a| Self(*a)).ok_or_else(|| UnknownAvatar(value.to_string()))
    }
    pub fn as_str(&self) -> &'static str { self.0 }
}

impl Default for Avatar {
    fn default() -> Self { Self(AVATARS[0]) }
}

impl TryFrom<String> for Avatar {
    type Error = UnknownAvatar;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<Avatar> for String {
    fn from(value: Avatar) -> Self { value.0.to_string() }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown avatar: {0}")]
pub struct UnknownAvatar(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    pub email: String,
    #[serde(default)]
    pub avatar: Avatar,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(uid: UserId, email: impl Into<String>) -> Self {
        Self { uid, email: email.into(), avatar: Avatar::default(), created_at: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_known_avatars() {
        assert_eq!(Avatar::parse("avatar-f2").unwrap().as_str(), "avatar-f2");
        assert!(Avatar::parse("avatar-x").is_err());
        assert!(serde_json::from_str::<Avatar>("\"avatar-zz\"").is_err());
        assert_eq!(Avatar::default().as_str(), "avatar-default");
    }
}
