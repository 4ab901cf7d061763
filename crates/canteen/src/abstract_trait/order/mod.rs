mod repository;
mod service;

pub use self::repository::{DynOrderQueryRepository, OrderQueryRepositoryTrait};
pub use self::service::{
    DynOrderCommandService, DynOrderQueryService, OrderCommandServiceTrait, OrderQueryServiceTrait,
};
