pub mod ats;
pub mod common;
pub mod subscription;
pub mod template;
pub mod user;

pub use ats::{AtsScore, JobTitleSynonym, KeywordMatches, OptimizationSuggestions};
pub use common::{ErrorBody, Paginated};
pub use subscription::{
    NewPlan, PaymentResult, PlanPatch, Subscription, SubscriptionPatch, SubscriptionPlan,
    SubscriptionStatus, Transaction, TransactionStatus,
};
pub use template::{CategoryPayload, NewTemplate, Template, TemplateCategory, TemplatePatch};
pub use user::{NewUser, User, UserActivity, UserPatch};
