//! Translation of semantic operations into wire requests.
//!
//! Resource layout under the connection's base path:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | select | `GET {collection}` with criteria |
//! | insert | `POST {collection}` with values |
//! | update (single) | `PUT {collection}/{id}` with values |
//! | update (bulk) | `PUT {collection}` with `{...criteria, data: values}` |
//! | destroy (single) | `DELETE {collection}/{id}` with criteria |
//! | destroy (bulk) | `DELETE find-n-destroy/{collection}` with criteria |
//! | add to / remove from | `POST`/`DELETE {collection}/{id}/{association}[/{foreignId}]` |
//!
//! Bulk destroy needs its own prefix because `DELETE {collection}` is already
//! bound by the server.

use serde_json::{Map, Value};

use crate::{
    AssociationTarget, ConnectionConfig, Criteria, ForeignTarget, Method, RecordId, Target,
    WireRequest,
};

/// Path prefix of the bulk-destroy route.
pub const FIND_AND_DESTROY: &str = "find-n-destroy";

/// Key under which bulk updates carry the new values.
pub const BULK_UPDATE_DATA_KEY: &str = "data";

/// Builds wire requests for one connection's base path.
#[derive(Debug, Clone, Copy)]
pub struct Routes<'a> {
    config: &'a ConnectionConfig,
}

impl<'a> Routes<'a> {
    pub fn new(config: &'a ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn select(&self, collection: &str, criteria: &Criteria) -> WireRequest {
        WireRequest::new(
            Method::Get,
            self.config.resource_path(&[collection]),
            criteria.to_payload(),
        )
    }

    pub fn insert(&self, collection: &str, values: &Value) -> WireRequest {
        WireRequest::new(
            Method::Post,
            self.config.resource_path(&[collection]),
            values.clone(),
        )
    }

    pub fn update(&self, collection: &str, criteria: &Criteria, values: &Value) -> WireRequest {
        match Target::resolve(criteria, Some(values)) {
            Target::Single(id) => WireRequest::new(
                Method::Put,
                self.record_path(collection, &id),
                values.clone(),
            ),
            Target::Bulk => {
                let mut body = object_of(criteria.to_payload());
                body.insert(BULK_UPDATE_DATA_KEY.to_owned(), values.clone());
                WireRequest::new(
                    Method::Put,
                    self.config.resource_path(&[collection]),
                    Value::Object(body),
                )
            }
        }
    }

    pub fn destroy(&self, collection: &str, criteria: &Criteria) -> WireRequest {
        let url = match Target::resolve(criteria, None) {
            Target::Single(id) => self.record_path(collection, &id),
            Target::Bulk => self.config.resource_path(&[FIND_AND_DESTROY, collection]),
        };
        WireRequest::new(Method::Delete, url, criteria.to_payload())
    }

    /// Builds an association mutation; `method` is `Post` to add and `Delete`
    /// to remove.
    pub fn association(
        &self,
        method: Method,
        collection: &str,
        target: &AssociationTarget,
    ) -> WireRequest {
        let id = target.id.to_string();
        match &target.foreign {
            ForeignTarget::Existing(foreign_id) => {
                let foreign_id = foreign_id.to_string();
                WireRequest::new(
                    method,
                    self.config
                        .resource_path(&[collection, &id, &target.association, &foreign_id]),
                    Value::Object(Map::new()),
                )
            }
            ForeignTarget::Data(data) => WireRequest::new(
                method,
                self.config
                    .resource_path(&[collection, &id, &target.association]),
                data.clone(),
            ),
        }
    }

    fn record_path(&self, collection: &str, id: &RecordId) -> String {
        self.config.resource_path(&[collection, &id.to_string()])
    }
}

fn object_of(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssociationCommand;
    use serde_json::json;

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            base_path: String::new(),
            ..ConnectionConfig::default()
        }
    }

    fn criteria(value: Value) -> Criteria {
        serde_json::from_value(value).expect("criteria")
    }

    #[test]
    fn select_sends_criteria_as_query() {
        let config = ConnectionConfig::default();
        let request = Routes::new(&config).select("pet", &criteria(json!({"limit": 2})));
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url, "/api/pet");
        assert_eq!(request.data, json!({"limit": 2}));
    }

    #[test]
    fn insert_posts_values() {
        let config = config();
        let request = Routes::new(&config).insert("Pet", &json!({"name": "Rex"}));
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "/Pet");
        assert_eq!(request.data, json!({"name": "Rex"}));
    }

    #[test]
    fn single_update_targets_the_record() {
        let config = config();
        let request =
            Routes::new(&config).update("Pet", &criteria(json!({"id": 5})), &json!({"name": "Rex"}));
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.url, "/Pet/5");
        assert_eq!(request.data, json!({"name": "Rex"}));
    }

    #[test]
    fn update_falls_back_to_id_in_values() {
        let config = config();
        let request = Routes::new(&config).update(
            "Pet",
            &Criteria::default(),
            &json!({"id": "rex-1", "name": "Rex"}),
        );
        assert_eq!(request.url, "/Pet/rex-1");
    }

    #[test]
    fn bulk_update_embeds_values_under_data() {
        let config = config();
        let request = Routes::new(&config).update(
            "Pet",
            &criteria(json!({"where": {"age": {">": 2}}})),
            &json!({"name": "Rex"}),
        );
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.url, "/Pet");
        assert_eq!(
            request.data,
            json!({"where": {"age": {">": 2}}, "data": {"name": "Rex"}})
        );
    }

    #[test]
    fn destroy_routes_single_and_bulk_differently() {
        let config = config();
        let routes = Routes::new(&config);

        let single = routes.destroy("Pet", &criteria(json!({"id": 5})));
        assert_eq!(single.method, Method::Delete);
        assert_eq!(single.url, "/Pet/5");

        let bulk = routes.destroy("Pet", &criteria(json!({"where": {"age": {">": 2}}})));
        assert_eq!(bulk.method, Method::Delete);
        assert_eq!(bulk.url, "/find-n-destroy/Pet");
        assert_eq!(bulk.data, json!({"where": {"age": {">": 2}}}));
    }

    #[test]
    fn destroy_with_id_list_is_bulk() {
        let config = config();
        let request = Routes::new(&config).destroy("Pet", &criteria(json!({"where": {"id": [1, 2]}})));
        assert_eq!(request.url, "/find-n-destroy/Pet");
    }

    #[test]
    fn textual_keys_stay_one_segment() {
        let config = config();
        let routes = Routes::new(&config);

        let single = routes.destroy("Pet", &criteria(json!({"id": "a/b"})));
        assert_eq!(single.url, "/Pet/a%2Fb");

        let command: AssociationCommand = serde_json::from_value(json!({
            "id": "x?y", "association": "toys#1", "foreignId": "../z"
        }))
        .expect("command");
        let target = AssociationTarget::parse(&command).expect("target");
        let request = routes.association(Method::Post, "Pet", &target);
        assert_eq!(request.url, "/Pet/x%3Fy/toys%231/..%2Fz");
    }

    #[test]
    fn association_with_foreign_id_appends_it_with_empty_body() {
        let config = ConnectionConfig::default();
        let command: AssociationCommand = serde_json::from_value(json!({
            "id": 1, "association": "toys", "foreignId": 9
        }))
        .expect("command");
        let target = AssociationTarget::parse(&command).expect("target");

        let request = Routes::new(&config).association(Method::Post, "pet", &target);
        assert_eq!(request.url, "/api/pet/1/toys/9");
        assert_eq!(request.data, json!({}));
    }

    #[test]
    fn association_with_foreign_data_posts_it() {
        let config = ConnectionConfig::default();
        let command: AssociationCommand = serde_json::from_value(json!({
            "id": 1, "association": "toys", "foreignData": {"name": "ball"}
        }))
        .expect("command");
        let target = AssociationTarget::parse(&command).expect("target");

        let request = Routes::new(&config).association(Method::Delete, "pet", &target);
        assert_eq!(request.method, Method::Delete);
        assert_eq!(request.url, "/api/pet/1/toys");
        assert_eq!(request.data, json!({"name": "ball"}));
    }
}
