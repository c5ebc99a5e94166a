//! Thread lifecycle operations, one submodule per operation.

mod create;
mod exit;
mod info;
mod join;
mod suspend;

pub use self::{
    create::{ThreadCreateError, create},
    info::{DEFAULT_STACK_SIZE, THREAD_NAME_LEN, Thread, ThreadAttr, ThreadEntry},
    join::join,
    suspend::resume,
};
