mod connector;

pub use connector::WsConnector;
