mod arena;
mod handle;
mod size;

pub(crate) mod avl;
pub(crate) mod order_statistic;
pub(crate) mod rb;
