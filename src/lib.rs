//! Vector sink connectors: a uniform contract for storing, querying and
//! deleting embeddings in a remote vector store, with an Epsilla Cloud backend.

pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{check_properties, SinkConnector};

pub use connector::{
    EpsillaClient, EpsillaConfig, EpsillaError, EpsillaSink, EpsillaVectorDb, InMemorySink,
};

pub use domain::{ConnectorError, SearchResult, SinkInfo, VectorRecord, FILE_ENTRY_ID_KEY};
