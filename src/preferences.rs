use crate::error::ClientResult;
use crate::protocol::{UpdatePreferencesRequest, UserPreferences};
use crate::transport::Transport;
use reqwest::Method;

const PREFERENCES_PATH: &str = "/v1/preferences";

#[derive(Clone)]
pub struct PreferencesApi {
    transport: Transport,
}

impl PreferencesApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn get(&self) -> ClientResult<UserPreferences> {
        self.transport
            .json::<(), _>(Method::GET, PREFERENCES_PATH, None)
            .await
    }

    pub async fn update(&self, update: &UpdatePreferencesRequest) -> ClientResult<UserPreferences> {
        self.transport
            .json(Method::PUT, PREFERENCES_PATH, Some(update))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentials;
    use crate::test_support;
    use axum::Json;
    use axum::extract::State;
    use axum::routing::get;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    type Stored = Arc<Mutex<Value>>;

    fn initial() -> Value {
        json!({
            "id": 3,
            "user_id": 1,
            "chicken_dishes_per_week": 3,
            "fish_dishes_per_week": 1,
            "vegetables_required": true,
            "eating_out_days": ["friday"],
            "leftovers_for_lunch": true,
            "likes": ["pasta"],
            "dislikes": ["olives"],
            "preferred_cuisines": ["italian", "thai"],
            "sauce_preference": "with sauce",
            "easy_meal_preference": "weekdays",
            "dietary_restrictions": [],
            "allergens": [],
            "avoid_meal_types": [],
            "other_items": ["milk", "eggs"],
            "created_at": "2025-06-01T12:00:00",
            "updated_at": "2025-06-01T12:00:00",
        })
    }

    async fn show(State(stored): State<Stored>) -> Json<Value> {
        Json(stored.lock().unwrap().clone())
    }

    async fn apply(State(stored): State<Stored>, Json(patch): Json<Value>) -> Json<Value> {
        let mut current = stored.lock().unwrap();
        if let (Some(target), Some(fields)) = (current.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Json(current.clone())
    }

    async fn setup() -> (PreferencesApi, Stored) {
        let stored: Stored = Arc::new(Mutex::new(initial()));
        let app = axum::Router::new()
            .route("/v1/preferences", get(show).put(apply))
            .with_state(stored.clone());
        let base = test_support::serve(app).await;
        let transport = Transport::new(
            base,
            reqwest::Client::new(),
            Arc::new(MemoryCredentials::with_token("jwt")),
        );
        (PreferencesApi::new(transport), stored)
    }

    #[tokio::test]
    async fn get_parses_full_record() {
        let (api, _) = setup().await;

        let prefs = api.get().await.unwrap();
        assert_eq!(prefs.chicken_dishes_per_week, 3);
        assert_eq!(prefs.preferred_cuisines, vec!["italian", "thai"]);
        assert_eq!(prefs.other_items, vec!["milk", "eggs"]);
    }

    #[tokio::test]
    async fn update_sends_only_changed_fields() {
        let (api, stored) = setup().await;

        let update = UpdatePreferencesRequest {
            fish_dishes_per_week: Some(2),
            allergens: Some(vec!["shellfish".to_string()]),
            ..Default::default()
        };
        let prefs = api.update(&update).await.unwrap();

        assert_eq!(prefs.fish_dishes_per_week, 2);
        assert_eq!(prefs.allergens, vec!["shellfish"]);
        // untouched fields survive the partial update
        assert_eq!(prefs.chicken_dishes_per_week, 3);
        assert_eq!(stored.lock().unwrap()["likes"], json!(["pasta"]));
    }
}
