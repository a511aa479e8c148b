//! Dispatcher construction from configuration

use super::{Archiver, Clock, Dispatcher, FileHandler, Handler, StatusRecorder};
use crate::catalog::{FileTypeCatalog, InMemoryCatalog};
use crate::checkers::CheckerRegistry;
use crate::config::{EntityKind, EtlConfig, HandlerConfig, ReaderKind};
use crate::entities::{OutboundLineMapper, RowMapper};
use crate::error::Result;
use crate::pipeline::{EntityMapper, Pipeline};
use crate::reader::{Reader, TextFileReader};
use crate::repository::JsonLinesRepository;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Shared, read-only pieces every handler is built from
struct Components {
    catalog: Arc<dyn FileTypeCatalog>,
    registry: Arc<CheckerRegistry>,
    status: Arc<dyn StatusRecorder>,
    archiver: Arc<Archiver>,
}

/// Validate `config` and build one handler per `[[handlers]]` entry.
///
/// Mapped entities are written as JSON lines under `<outputs>/<file type code>/`.
pub fn build_dispatcher(
    config: &EtlConfig,
    status: Arc<dyn StatusRecorder>,
    clock: Arc<dyn Clock>,
) -> Result<Dispatcher> {
    config.validate()?;

    let components = Components {
        catalog: Arc::new(InMemoryCatalog::from_file_types(config.file_types.clone())?),
        registry: Arc::new(CheckerRegistry::standard()),
        status,
        archiver: Arc::new(
            Archiver::new(&config.directories.processed, &config.directories.errors)
                .with_clock(clock),
        ),
    };

    let handlers = config
        .handlers
        .iter()
        .map(|handler| build_handler(config, handler, &components))
        .collect::<Result<Vec<_>>>()?;

    debug!("Built dispatcher with {} handler(s)", handlers.len());
    Dispatcher::new(handlers)
}

fn build_handler(
    config: &EtlConfig,
    handler: &HandlerConfig,
    components: &Components,
) -> Result<Arc<dyn Handler>> {
    let handler: Arc<dyn Handler> = match handler.entity {
        EntityKind::Row => Arc::new(file_handler(config, handler, components, RowMapper)?),
        EntityKind::OutboundLine => Arc::new(file_handler(
            config,
            handler,
            components,
            OutboundLineMapper,
        )?),
    };
    Ok(handler)
}

fn file_handler<T, M>(
    config: &EtlConfig,
    handler: &HandlerConfig,
    components: &Components,
    mapper: M,
) -> Result<FileHandler<T>>
where
    T: Serialize + 'static,
    M: EntityMapper<T> + 'static,
{
    let reader: Arc<dyn Reader> = match handler.reader {
        ReaderKind::Text => Arc::new(TextFileReader::new()),
    };
    let repository = JsonLinesRepository::new(config.outputs_dir().join(&handler.file_type));

    Ok(FileHandler::new(
        &handler.name,
        handler.predicate()?,
        &handler.file_type,
        components.catalog.clone(),
        reader,
        Pipeline::standard(components.registry.clone(), Arc::new(mapper)),
        Arc::new(repository),
        components.status.clone(),
        components.archiver.clone(),
    ))
}
