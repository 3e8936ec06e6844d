pub mod applier;
pub mod builder;
pub mod cluster;
pub mod config;
pub mod declaration;
pub mod diff;
pub mod error;
pub mod factory;
pub mod manager;
pub mod reader;
pub mod schema;
pub mod strategy;
pub use cluster::{ SearchCluster, create_search_cluster, ClusterConfig };
pub use config::{ IndexStatus, SchemaManagementConfig };
pub use declaration::{ EntityDeclaration, load_declarations };
pub use diff::SchemaDiff;
pub use error::{ SchemaError, SchemaResult };
pub use manager::{ IndexSchemaManager, SyncOutcome };
pub use schema::IndexSchema;
pub use strategy::{ SchemaAction, SchemaStrategy };
