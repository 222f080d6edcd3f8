pub mod exchanger;
pub mod negotiator;
pub mod request;
pub mod response;

pub use exchanger::{retrieve_token, ExchangeRequest, TokenExchanger};
pub use request::{build_token_request, ClientCredentials, FormParams, TokenRequest};
