use std::fmt;

use super::error::{BridgeError, BridgeResult};
use super::request::Argument;

/// The CRUD methods every generated service exposes, in service order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 5] = [
        RpcMethod::Get,
        RpcMethod::List,
        RpcMethod::Create,
        RpcMethod::Update,
        RpcMethod::Delete,
    ];

    /// Method name as it appears in the generated service.
    pub fn as_str(self) -> &'static str {
        match self {
            RpcMethod::Get => "Get",
            RpcMethod::List => "List",
            RpcMethod::Create => "Create",
            RpcMethod::Update => "Update",
            RpcMethod::Delete => "Delete",
        }
    }

    /// Arguments a request for this method cannot do without.
    pub fn required_arguments(self) -> &'static [Argument] {
        match self {
            RpcMethod::Get | RpcMethod::Delete => &[Argument::Id],
            RpcMethod::List => &[],
            RpcMethod::Create => &[Argument::Entity],
            RpcMethod::Update => &[Argument::Id, Argument::Entity],
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an HTTP method to the RPC method it invokes.
///
/// | verb   | id  | method |
/// |--------|-----|--------|
/// | GET    | yes | Get    |
/// | GET    | no  | List   |
/// | POST   | any | Create |
/// | PUT    | any | Update |
/// | DELETE | any | Delete |
pub fn map_verb(http_method: &str, has_identifier: bool) -> BridgeResult<RpcMethod> {
    let verb = http_method.trim();
    if verb.eq_ignore_ascii_case("GET") {
        Ok(if has_identifier {
            RpcMethod::Get
        } else {
            RpcMethod::List
        })
    } else if verb.eq_ignore_ascii_case("POST") {
        Ok(RpcMethod::Create)
    } else if verb.eq_ignore_ascii_case("PUT") {
        Ok(RpcMethod::Update)
    } else if verb.eq_ignore_ascii_case("DELETE") {
        Ok(RpcMethod::Delete)
    } else {
        Err(BridgeError::UnsupportedVerb(verb.to_string()))
    }
}
