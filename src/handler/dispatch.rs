//! Request to handler dispatch

use super::{HandleReport, Handler};
use crate::error::{EtlError, Result};
use crate::models::FileRequest;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Ordered handler list with mutually exclusive predicates
pub struct Dispatcher {
    handlers: Vec<Arc<dyn Handler>>,
}

impl Dispatcher {
    /// Reject duplicate handler names and identical predicate sets
    pub fn new(handlers: Vec<Arc<dyn Handler>>) -> Result<Self> {
        Self::check_exclusive(&handlers)?;
        Ok(Self { handlers })
    }

    fn check_exclusive(handlers: &[Arc<dyn Handler>]) -> Result<()> {
        let mut names = HashSet::new();
        let mut predicates = HashMap::new();

        for handler in handlers {
            if !names.insert(handler.name()) {
                return Err(EtlError::configuration(format!(
                    "duplicate handler name '{}'",
                    handler.name()
                )));
            }
            if let Some(other) = predicates.insert(handler.predicate().key(), handler.name()) {
                return Err(EtlError::configuration(format!(
                    "handlers '{}' and '{}' declare the same client, subdirectory and file pattern",
                    other,
                    handler.name()
                )));
            }
        }
        Ok(())
    }

    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    /// The single handler accepting `request`
    pub fn find(&self, request: &FileRequest) -> Result<&Arc<dyn Handler>> {
        let matching: Vec<&Arc<dyn Handler>> = self
            .handlers
            .iter()
            .filter(|h| h.can_handle(request))
            .collect();

        match matching.as_slice() {
            [handler] => Ok(*handler),
            [] => Err(EtlError::NoHandler {
                path: request.path().to_path_buf(),
            }),
            _ => Err(EtlError::AmbiguousHandler {
                path: request.path().to_path_buf(),
                handlers: matching.iter().map(|h| h.name().to_string()).collect(),
            }),
        }
    }

    /// Hand the request to its handler; unmatched files stay where they are
    pub fn dispatch(&self, request: &FileRequest) -> Result<HandleReport> {
        match self.find(request) {
            Ok(handler) => Ok(handler.handle(request)),
            Err(e) => {
                warn!("{}", e);
                Err(e)
            }
        }
    }
}
