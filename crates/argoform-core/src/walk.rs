//! Deterministic traversal of the configuration tree
//!
//! [`walk`] visits every environment in declaration order, calling
//! [`Visitor::visit_environment`] and then [`Visitor::visit_application`] for
//! each of its applications. The first visitor error aborts the walk.

use std::fmt;

use crate::config::{Application, Environment, Manifest};

/// Callbacks invoked while walking a [`Manifest`]
pub trait Visitor {
    type Error;

    fn visit_environment(&mut self, env: &Environment) -> Result<(), Self::Error>;

    fn visit_application(
        &mut self,
        env: &Environment,
        app: &Application,
    ) -> Result<(), Self::Error>;
}

/// Entity being visited when a walk aborted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitPoint {
    Environment { env: String },
    Application { env: String, app: String },
}

impl fmt::Display for VisitPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment { env } => write!(f, "environment '{}'", env),
            Self::Application { env, app } => {
                write!(f, "application '{}' in environment '{}'", app, env)
            }
        }
    }
}

/// A walk stopped by a visitor error
#[derive(Debug)]
pub struct Aborted<E> {
    pub at: VisitPoint,
    pub error: E,
}

/// Walk the manifest, stopping at the first visitor error
pub fn walk<V: Visitor>(manifest: &Manifest, visitor: &mut V) -> Result<(), Aborted<V::Error>> {
    for env in &manifest.environments {
        visitor.visit_environment(env).map_err(|error| Aborted {
            at: VisitPoint::Environment {
                env: env.name.clone(),
            },
            error,
        })?;

        for app in &env.apps {
            visitor.visit_application(env, app).map_err(|error| Aborted {
                at: VisitPoint::Application {
                    env: env.name.clone(),
                    app: app.name.clone(),
                },
                error,
            })?;
        }
    }
    Ok(())
}
