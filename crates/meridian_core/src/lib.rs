pub mod chat;
pub mod domain;
pub mod ports;
pub mod routing;

pub use chat::{Bubble, BubbleKind, ChatMirror};
pub use domain::{
    Account, ApplicationUpdate, AuthSession, Message, Profile, ProfileStatus, Transaction, User,
    UserCredentials,
};
pub use ports::{
    DatabaseService, PortError, PortResult, RealtimeEvent, RealtimeService, RealtimeSubscription,
    StorageService,
};
pub use routing::{Page, RouteAction};
