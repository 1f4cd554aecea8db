// HTTP transport abstraction: the vendor API seen as form/JSON/query requests.

pub mod http_transport;
pub mod traits;
