pub mod record;
pub mod request;
pub mod request_id;
pub mod enrich;
pub mod serializer;
pub mod layer;

pub mod init;
pub mod env;
