//! Database row models
//!
//! These are storage-shaped types; request/response DTOs live beside the
//! handlers that use them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Membership tier for a site account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipLevel {
    Base,
    Advocate,
    Ambassador,
}

impl MembershipLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "base" => Some(Self::Base),
            "advocate" => Some(Self::Advocate),
            "ambassador" => Some(Self::Ambassador),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Advocate => "advocate",
            Self::Ambassador => "ambassador",
        }
    }
}

/// Account role. Admin unlocks the dashboard read views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }
}

/// A site account. Owned by the account subsystem; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub full_name: Option<String>,
    pub country: Option<String>,
    pub membership_level: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::Member)
    }
}

/// A resolved session row. The token is the cookie value, verbatim.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// One tracked interaction. Immutable once written.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserEvent {
    pub id: String,
    pub user_id: Option<String>,
    pub event_type: String,
    pub event_data: Option<String>,
    pub path: String,
    pub session_id: String,
    pub referrer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A recommended album on the community board.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub release_group_mbid: String,
    pub title: String,
    pub artist: String,
    pub cover_url: Option<String>,
    pub vote_count: i64,
    pub featured_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One vote for an album. Deleted wholesale on a re-feature reset.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Vote {
    pub id: String,
    pub album_id: String,
    pub voter_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A board comment, top-level or a single-level reply.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub album_id: String,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_roundtrip() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("member"), Some(Role::Member));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn membership_parse_roundtrip() {
        for level in [
            MembershipLevel::Base,
            MembershipLevel::Advocate,
            MembershipLevel::Ambassador,
        ] {
            assert_eq!(MembershipLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(MembershipLevel::parse("platinum"), None);
    }

    #[test]
    fn unknown_role_defaults_to_member() {
        let user = User {
            id: "u1".into(),
            email: "a@example.com".into(),
            display_name: "A".into(),
            full_name: None,
            country: None,
            membership_level: "base".into(),
            role: "garbage".into(),
            created_at: Utc::now(),
        };
        assert_eq!(user.role(), Role::Member);
    }

    #[test]
    fn session_expiry() {
        let now = Utc::now();
        let session = Session {
            token: "t".into(),
            user_id: "u".into(),
            created_at: now - chrono::Duration::hours(2),
            expires_at: now - chrono::Duration::hours(1),
        };
        assert!(session.is_expired(now));
        assert!(!session.is_expired(now - chrono::Duration::hours(1) - chrono::Duration::seconds(1)));
    }
}
