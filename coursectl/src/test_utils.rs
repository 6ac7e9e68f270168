//! Shared fixtures for unit and handler tests.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    AppState,
    config::{Config, ProvisioningConfig, ScmProviderConfig},
    db::{
        InMemoryStore,
        models::{
            courses::CourseDBResponse,
            groups::GroupCreateDBRequest,
            users::{RemoteIdentity, UserDBResponse},
        },
    },
    provisioning::GroupProvisioner,
    scm::{Directory, DummyScm, ScmSessions},
    types::{CourseId, GroupId, GroupStatus, RemoteId, UserId},
};

pub const PROVIDER: &str = "P";
pub const TEACHER_ID: UserId = 10;

/// Access token of `user_id` for `provider`
pub fn token_for(user_id: UserId, provider: &str) -> String {
    format!("token-{user_id}-{provider}")
}

pub fn test_user(id: UserId, name: &str, is_admin: bool, links: &[(&str, RemoteId)]) -> UserDBResponse {
    UserDBResponse {
        id,
        name: name.to_string(),
        is_admin,
        remote_identities: links
            .iter()
            .map(|(provider, remote_id)| RemoteIdentity {
                provider: provider.to_string(),
                remote_id: *remote_id,
                access_token: token_for(id, provider),
            })
            .collect(),
    }
}

pub fn create_test_config() -> Config {
    Config {
        providers: HashMap::from([(PROVIDER.to_string(), ScmProviderConfig::Dummy)]),
        ..Default::default()
    }
}

pub fn create_test_state(store: InMemoryStore) -> AppState {
    AppState::builder()
        .config(create_test_config())
        .store(Arc::new(store))
        .build()
}

/// A course on provider "P" in directory "org/course", with group "g42" of two linked students
/// and a teacher holding a live session.
pub struct Fixture {
    pub store: InMemoryStore,
    pub scm: DummyScm,
    pub sessions: ScmSessions,
    pub directory: Directory,
    pub teacher: UserDBResponse,
    pub group_id: GroupId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_members(vec![
            test_user(1, "u1", false, &[(PROVIDER, 7)]),
            test_user(2, "u2", false, &[(PROVIDER, 9)]),
        ])
    }

    pub fn with_members(members: Vec<UserDBResponse>) -> Self {
        let store = InMemoryStore::new();
        let scm = DummyScm::new();
        let sessions = ScmSessions::new();
        let directory = Directory {
            id: 100,
            path: "org/course".to_string(),
        };
        scm.add_directory(directory.clone());
        scm.add_username(7, "u1-handle");
        scm.add_username(9, "u2-handle");

        let teacher = test_user(TEACHER_ID, "teacher", true, &[(PROVIDER, 70)]);
        store.insert_user(teacher.clone()).unwrap();
        sessions.insert(token_for(TEACHER_ID, PROVIDER), Arc::new(scm.clone()));

        let member_ids = members.iter().map(|m| m.id).collect();
        for member in members {
            store.insert_user(member).unwrap();
        }
        store.insert_course(CourseDBResponse {
            id: 1,
            name: "dat320".to_string(),
            provider: PROVIDER.to_string(),
            directory_id: directory.id,
        });
        let group_id = store
            .insert_group(GroupCreateDBRequest {
                name: "g42".to_string(),
                course_id: 1,
                status: GroupStatus::Pending,
                members: member_ids,
            })
            .unwrap();

        Self {
            store,
            scm,
            sessions,
            directory,
            teacher,
            group_id,
        }
    }

    pub fn provisioner(&self, config: ProvisioningConfig) -> GroupProvisioner {
        GroupProvisioner::new(Arc::new(self.store.clone()), self.sessions.clone(), config)
    }

    pub fn state(&self) -> AppState {
        AppState::builder()
            .config(create_test_config())
            .store(Arc::new(self.store.clone()))
            .sessions(self.sessions.clone())
            .build()
    }
}

/// Insert a user with identity links, returning its id
pub async fn insert_pg_user(pool: &PgPool, name: &str, is_admin: bool, links: &[(&str, RemoteId)]) -> UserId {
    let id: UserId = sqlx::query_scalar("INSERT INTO users (name, is_admin) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(is_admin)
        .fetch_one(pool)
        .await
        .unwrap();
    for (provider, remote_id) in links {
        sqlx::query("INSERT INTO remote_identities (user_id, provider, remote_id, access_token) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(*provider)
            .bind(*remote_id)
            .bind(token_for(id, provider))
            .execute(pool)
            .await
            .unwrap();
    }
    id
}

pub async fn insert_pg_course(pool: &PgPool, provider: &str, directory_id: RemoteId) -> CourseId {
    sqlx::query_scalar("INSERT INTO courses (name, provider, directory_id) VALUES ('dat320', $1, $2) RETURNING id")
        .bind(provider)
        .bind(directory_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Insert a pending group, enrolling `members` in the given order
pub async fn insert_pg_group(pool: &PgPool, course_id: CourseId, name: &str, members: &[UserId]) -> GroupId {
    let id: GroupId = sqlx::query_scalar("INSERT INTO groups (name, course_id) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(course_id)
        .fetch_one(pool)
        .await
        .unwrap();
    for member in members {
        sqlx::query("INSERT INTO group_users (group_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(member)
            .execute(pool)
            .await
            .unwrap();
    }
    id
}
