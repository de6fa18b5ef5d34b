//! Resource calls routed through the bridge onto a hand-written UserService.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use dynapi::bridge::{
    parse_entity, parse_id, BindError, Binding, BridgeConfig, BridgeError, CallContext, MethodKind,
    Page, ProtocolBridge, RequestShape, ResourceCall, RpcStatus, ServiceTable, StatusCode,
};
use dynapi::metadata::{DataType, EntityConfiguration, PropertyConfiguration};
use dynapi::repository::EntityRepository;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: i64,
    name: String,
}

#[derive(Default)]
struct GetUserRequest {
    id: i64,
}

impl RequestShape for GetUserRequest {
    fn set_id(&mut self, id: &str) -> Result<Binding, BindError> {
        self.id = parse_id(id)?;
        Ok(Binding::Bound)
    }
}

#[derive(Default)]
struct ListUserRequest {
    page: Option<Page>,
}

impl RequestShape for ListUserRequest {
    fn set_page(&mut self, page: Page) -> Result<Binding, BindError> {
        self.page = Some(page);
        Ok(Binding::Bound)
    }
}

#[derive(Serialize)]
struct ListUserResponse {
    items: Vec<User>,
    total_count: usize,
}

#[derive(Default)]
struct CreateUserRequest {
    entity: Option<User>,
}

impl RequestShape for CreateUserRequest {
    fn set_entity(&mut self, entity: &Value) -> Result<Binding, BindError> {
        self.entity = Some(parse_entity(entity)?);
        Ok(Binding::Bound)
    }
}

#[derive(Default)]
struct UpdateUserRequest {
    id: i64,
    entity: Option<User>,
}

impl RequestShape for UpdateUserRequest {
    fn set_id(&mut self, id: &str) -> Result<Binding, BindError> {
        self.id = parse_id(id)?;
        Ok(Binding::Bound)
    }

    fn set_entity(&mut self, entity: &Value) -> Result<Binding, BindError> {
        self.entity = Some(parse_entity(entity)?);
        Ok(Binding::Bound)
    }
}

#[derive(Serialize)]
struct DeleteUserResponse {
    success: bool,
}

type Store = Arc<Mutex<BTreeMap<i64, User>>>;

fn user_service(store: Store) -> ServiceTable {
    let get = store.clone();
    let list = store.clone();
    let create = store.clone();
    let update = store.clone();
    let delete = store;

    ServiceTable::new("UserService")
        .unary("Get", move |req: GetUserRequest| {
            let store = get.clone();
            async move {
                let user = store.lock().unwrap().get(&req.id).cloned();
                user.ok_or_else(|| RpcStatus::not_found(format!("user {} not found", req.id)))
            }
        })
        .unary("List", move |req: ListUserRequest| {
            let store = list.clone();
            async move {
                let page = req.page.unwrap_or(Page { number: 1, size: 10 });
                let users = store.lock().unwrap();
                Ok::<_, RpcStatus>(ListUserResponse {
                    items: users
                        .values()
                        .skip(page.offset())
                        .take(page.size as usize)
                        .cloned()
                        .collect(),
                    total_count: users.len(),
                })
            }
        })
        .unary("Create", move |req: CreateUserRequest| {
            let store = create.clone();
            async move {
                let user = req
                    .entity
                    .ok_or_else(|| RpcStatus::invalid_argument("entity is required"))?;
                let mut users = store.lock().unwrap();
                if users.contains_key(&user.id) {
                    return Err(RpcStatus::already_exists(format!("user {}", user.id)));
                }
                users.insert(user.id, user.clone());
                Ok(user)
            }
        })
        .unary_with_context("Update", move |req: UpdateUserRequest, ctx: CallContext| {
            let store = update.clone();
            async move {
                if !ctx.is_placeholder() {
                    return Err(RpcStatus::internal("expected a bridge call"));
                }
                let mut user = req
                    .entity
                    .ok_or_else(|| RpcStatus::invalid_argument("entity is required"))?;
                let mut users = store.lock().unwrap();
                if !users.contains_key(&req.id) {
                    return Err(RpcStatus::not_found(format!("user {}", req.id)));
                }
                user.id = req.id;
                users.insert(req.id, user.clone());
                Ok(user)
            }
        })
        .blocking("Delete", move |req: GetUserRequest| {
            let removed = delete.lock().unwrap().remove(&req.id).is_some();
            Ok(DeleteUserResponse { success: removed })
        })
}

fn seeded_store() -> Store {
    let mut users = BTreeMap::new();
    for (id, name) in [(1, "Ada"), (2, "Grace"), (3, "Linus")] {
        users.insert(
            id,
            User {
                id,
                name: name.to_string(),
            },
        );
    }
    Arc::new(Mutex::new(users))
}

fn bridge(store: Store) -> ProtocolBridge {
    let repo = EntityRepository::new();
    repo.replace([EntityConfiguration::builder("User")
        .property(PropertyConfiguration::new("Id", DataType::Int64).primary_key())
        .property(PropertyConfiguration::new("Name", DataType::String))
        .build()
        .unwrap()])
        .unwrap();

    let mut bridge = ProtocolBridge::new(Arc::new(repo), BridgeConfig::default());
    bridge.register(user_service(store));
    bridge
}

async fn call(
    bridge: &ProtocolBridge,
    method: &str,
    path: &str,
    query: Option<&str>,
    body: Option<&str>,
) -> Result<Value, BridgeError> {
    let call = ResourceCall::parse(method, path, query, body, &bridge.config().path_prefix)?;
    bridge.dispatch(&call).await
}

#[tokio::test]
async fn test_get_by_id() {
    let bridge = bridge(seeded_store());
    let user = call(&bridge, "GET", "/api/users/2", None, None).await.unwrap();
    assert_eq!(user, json!({"id": 2, "name": "Grace"}));
}

#[tokio::test]
async fn test_get_missing_maps_to_not_found() {
    let bridge = bridge(seeded_store());
    let err = call(&bridge, "GET", "/api/users/99", None, None)
        .await
        .unwrap_err();
    assert!(matches!(&err, BridgeError::Rpc(status) if status.code == StatusCode::NotFound));
    assert_eq!(err.http_status(), 404);
}

#[tokio::test]
async fn test_list_pages() {
    let bridge = bridge(seeded_store());
    let page = call(&bridge, "GET", "/api/users", Some("pageNumber=2&pageSize=2"), None)
        .await
        .unwrap();
    assert_eq!(
        page,
        json!({"items": [{"id": 3, "name": "Linus"}], "total_count": 3})
    );
}

#[tokio::test]
async fn test_create_update_delete() {
    let store = seeded_store();
    let bridge = bridge(store.clone());

    let created = call(
        &bridge,
        "POST",
        "/api/User",
        None,
        Some(r#"{"id": 4, "name": "Barbara"}"#),
    )
    .await
    .unwrap();
    assert_eq!(created["name"], "Barbara");

    let dup = call(&bridge, "POST", "/api/users", None, Some(r#"{"id": 4, "name": "B"}"#))
        .await
        .unwrap_err();
    assert_eq!(dup.http_status(), 409);

    let updated = call(
        &bridge,
        "PUT",
        "/api/users/4",
        None,
        Some(r#"{"id": 0, "name": "Barbara Liskov"}"#),
    )
    .await
    .unwrap();
    assert_eq!(updated, json!({"id": 4, "name": "Barbara Liskov"}));

    let deleted = call(&bridge, "DELETE", "/api/users/4", None, None).await.unwrap();
    assert_eq!(deleted, json!({"success": true}));
    assert!(!store.lock().unwrap().contains_key(&4));
}

#[tokio::test]
async fn test_invocation_errors() {
    let bridge = bridge(seeded_store());

    let err = call(&bridge, "POST", "/api/users", None, None).await.unwrap_err();
    assert_eq!(
        err,
        BridgeError::Invocation("missing required argument 'entity'".into())
    );

    let err = call(&bridge, "GET", "/api/users/abc", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Invocation(msg) if msg.contains("invalid id 'abc'")));

    let err = call(&bridge, "DELETE", "/api/users", None, None).await.unwrap_err();
    assert_eq!(err, BridgeError::Invocation("missing required argument 'id'".into()));
}

#[tokio::test]
async fn test_update_without_id_is_rejected() {
    let store = seeded_store();
    store.lock().unwrap().insert(
        0,
        User {
            id: 0,
            name: "zero".into(),
        },
    );
    let bridge = bridge(store.clone());

    let err = call(&bridge, "PUT", "/api/users", None, Some(r#"{"id": 2, "name": "X"}"#))
        .await
        .unwrap_err();
    assert_eq!(err, BridgeError::Invocation("missing required argument 'id'".into()));
    assert_eq!(err.http_status(), 400);
    assert_eq!(store.lock().unwrap()[&0].name, "zero");
    assert_eq!(store.lock().unwrap()[&2].name, "Grace");
}

#[tokio::test]
async fn test_routing_errors() {
    let bridge = bridge(seeded_store());

    let err = call(&bridge, "PATCH", "/api/users/1", None, None)
        .await
        .unwrap_err();
    assert_eq!(err, BridgeError::UnsupportedVerb("PATCH".into()));
    assert_eq!(err.http_status(), 405);

    let err = call(&bridge, "GET", "/api/invoices", None, None)
        .await
        .unwrap_err();
    assert_eq!(err, BridgeError::EntityNotFound("invoices".into()));
}

#[tokio::test]
async fn test_entity_without_service_is_method_not_found() {
    let repo = EntityRepository::new();
    repo.replace([EntityConfiguration::builder("Invoice").build().unwrap()])
        .unwrap();
    let bridge = ProtocolBridge::new(Arc::new(repo), BridgeConfig::default());

    let err = bridge
        .dispatch(&ResourceCall::new("GET", "invoices").with_id("1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BridgeError::MethodNotFound {
            service: "InvoiceService".into(),
            method: "Get".into()
        }
    );
    assert_eq!(err.http_status(), 501);
}

#[test]
fn test_service_table_introspection() {
    let table = user_service(seeded_store());
    assert_eq!(table.name(), "UserService");
    assert_eq!(
        table.method_names(),
        ["Create", "Delete", "Get", "List", "Update"]
    );
    assert_eq!(table.kind("Update"), Some(MethodKind::UnaryWithContext));
    assert_eq!(table.kind("Delete"), Some(MethodKind::Blocking));
    assert_eq!(table.kind("Watch"), None);
}
