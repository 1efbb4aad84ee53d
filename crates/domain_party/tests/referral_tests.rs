//! Referral resolution and ancestor chain walking

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use core_kernel::{DomainPort, PortError, UserId};
use domain_party::{
    NewUser, OrganizationChain, ReferralResolver, User, UserDirectory, UserRole,
};

#[derive(Default)]
struct MapDirectory {
    users: Mutex<HashMap<UserId, User>>,
}

impl MapDirectory {
    fn with(users: Vec<User>) -> Arc<Self> {
        let map = users.into_iter().map(|u| (u.id, u)).collect();
        Arc::new(Self {
            users: Mutex::new(map),
        })
    }
}

impl DomainPort for MapDirectory {}

#[async_trait]
impl UserDirectory for MapDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, PortError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, PortError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, _user: NewUser) -> Result<User, PortError> {
        Err(PortError::internal("not used in these tests"))
    }

    async fn find_referred_by(&self, id: UserId) -> Result<Vec<User>, PortError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.referred_by == Some(id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<User>, PortError> {
        Ok(self.users.lock().unwrap().values().cloned().collect())
    }

    async fn set_approved(&self, id: UserId, approved: bool) -> Result<User, PortError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("User", id))?;
        user.is_approved = approved;
        Ok(user.clone())
    }
}

fn user(name: &str, role: UserRole) -> User {
    User::new(
        name,
        format!("{}@example.com", name.to_lowercase()),
        "$2b$10$hash",
        role,
    )
}

#[tokio::test]
async fn resolver_finds_users_by_id_string() {
    let producer = user("Pedro", UserRole::Producer);
    let directory = MapDirectory::with(vec![producer.clone()]);
    let resolver = ReferralResolver::new(directory);

    let resolved = resolver.resolve(&producer.id.to_string()).await.unwrap();
    assert_eq!(resolved.id, producer.id);
}

#[tokio::test]
async fn resolver_swallows_bad_codes() {
    let directory = MapDirectory::with(vec![]);
    let resolver = ReferralResolver::new(directory);

    assert!(resolver.resolve("garbage").await.is_none());
    assert!(resolver.resolve(&UserId::new().to_string()).await.is_none());
}

#[tokio::test]
async fn chain_walks_ancestors_nearest_first() {
    let organizer = user("Olga", UserRole::Organizer);
    let middle = user("Marta", UserRole::Producer).with_referrer(organizer.id);
    let producer = user("Pedro", UserRole::Producer).with_referrer(middle.id);
    let directory = MapDirectory::with(vec![organizer.clone(), middle.clone(), producer.clone()]);

    let chain = OrganizationChain::new(directory)
        .ancestors(producer.id)
        .await
        .unwrap();
    let ids: Vec<UserId> = chain.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![middle.id, organizer.id]);
}

#[tokio::test]
async fn chain_respects_depth_and_cycles() {
    let mut a = user("A", UserRole::Producer);
    let b = user("B", UserRole::Producer).with_referrer(a.id);
    a.referred_by = Some(b.id);
    let directory = MapDirectory::with(vec![a.clone(), b.clone()]);

    // The cycle terminates the walk instead of looping.
    let chain = OrganizationChain::new(directory.clone())
        .ancestors(a.id)
        .await
        .unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].id, b.id);

    let shallow = OrganizationChain::new(directory)
        .with_max_depth(0)
        .ancestors(a.id)
        .await
        .unwrap();
    assert!(shallow.is_empty());
}

#[tokio::test]
async fn chain_errors_on_unknown_root() {
    let directory = MapDirectory::with(vec![]);
    let err = OrganizationChain::new(directory)
        .ancestors(UserId::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
