// [libs/domain/models/src/lib.rs]

pub mod account;
pub mod actor;
pub mod identity;
pub mod node;
pub mod provider;
pub mod sync;
pub mod token;

pub use account::{Account, AccountConfig, AccountFeatures, OutdatedGatewayNotification};
pub use actor::{Actor, ActorType};
pub use identity::{ActorGroup, CreatedBy, Identity, Membership, MembershipTuple, ProviderState};
pub use node::{Gateway, Relay};
pub use provider::{AdapterState, Provider, ProviderAdapter, Provisioner};
pub use sync::{
    GroupSyncPlan, IdentitySyncPlan, MembershipSyncPlan, ProviderSyncPlan, RemoteGroup, RemoteUser,
};
pub use token::{CreatedToken, Token, TokenType};
