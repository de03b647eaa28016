//! Command builder and HTTP dispatcher for remote game-server administration.
//!
//! A [`catalog::Command`] declares its shape as a [`syntax::Syntax`]; operator
//! input goes into a [`store::ParameterStore`]; [`render::render`] turns both
//! into the wire command line; [`dispatcher::Dispatcher`] posts it and returns
//! a classified [`dispatcher::Outcome`].

pub mod catalog;
pub mod choices;
pub mod dispatcher;
pub mod error;
pub mod paths;
pub mod persist;
pub mod render;
pub mod response;
pub mod session;
pub mod settings;
pub mod store;
pub mod syntax;

pub use catalog::{Catalog, Command};
pub use dispatcher::{Dispatcher, Outcome};
pub use error::AppError;
pub use render::{id_portion, render};
pub use store::ParameterStore;
pub use syntax::{Field, FieldMode, Syntax};
