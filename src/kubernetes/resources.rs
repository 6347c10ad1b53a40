// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Idempotent upsert primitives for namespaces, secrets, and config maps.
//!
//! All three follow the same read-then-patch-or-create pattern. Patches
//! send the full desired body with strategic merge semantics: on the map
//! fields (`stringData`, `data`) that is a shallow key merge, so keys
//! already on the live object but absent from the payload survive.

use crate::error::Result;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret};
use kube::api::{ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::{debug, info};

/// How an upsert converged the target object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
    Exists,
}

impl Upsert {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upsert::Created => "created",
            Upsert::Updated => "updated",
            Upsert::Exists => "exists",
        }
    }
}

/// Ensure a namespace exists, creating it when missing.
pub async fn ensure_namespace(client: &Client, name: &str) -> Result<Upsert> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.get(name).await {
        Ok(_) => {
            debug!("Namespace {} already exists", name);
            Ok(Upsert::Exists)
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            info!("Creating namespace {}", name);
            let ns = Namespace {
                metadata: ObjectMeta {
                    name: Some(name.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            };
            namespaces.create(&PostParams::default(), &ns).await?;
            Ok(Upsert::Created)
        }
        Err(e) => Err(e.into()),
    }
}

/// Create or patch an opaque secret with the given string data and labels.
pub async fn ensure_secret(
    client: &Client,
    name: &str,
    namespace: &str,
    data: &BTreeMap<String, String>,
    labels: Option<&BTreeMap<String, String>>,
) -> Result<Upsert> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let desired = Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: labels.filter(|l| !l.is_empty()).cloned(),
            ..Default::default()
        },
        string_data: Some(data.clone()),
        ..Default::default()
    };

    let outcome = upsert(&secrets, name, &desired).await?;
    info!("Secret {} in {}: {}", name, namespace, outcome.as_str());
    Ok(outcome)
}

/// Create or patch a config map. The target store only holds strings, so
/// every value is coerced to its string representation first.
pub async fn ensure_config_map(
    client: &Client,
    name: &str,
    namespace: &str,
    data: &serde_json::Map<String, serde_json::Value>,
) -> Result<Upsert> {
    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
    let string_data: BTreeMap<String, String> = data
        .iter()
        .map(|(k, v)| (k.clone(), coerce_string(v)))
        .collect();

    let desired = ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(string_data),
        ..Default::default()
    };

    let outcome = upsert(&config_maps, name, &desired).await?;
    info!("ConfigMap {} in {}: {}", name, namespace, outcome.as_str());
    Ok(outcome)
}

/// String form of a JSON value: strings unquoted, scalars via Display,
/// compound values as compact JSON.
pub(crate) fn coerce_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn upsert<K>(api: &Api<K>, name: &str, desired: &K) -> Result<Upsert>
where
    K: Clone + DeserializeOwned + Serialize + Debug,
{
    match api.get(name).await {
        Ok(_) => {
            api.patch(name, &PatchParams::default(), &Patch::Strategic(desired))
                .await?;
            Ok(Upsert::Updated)
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            api.create(&PostParams::default(), desired).await?;
            Ok(Upsert::Created)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{namespace_json, not_found_json, object_json, MockApiServer};
    use serde_json::json;

    #[tokio::test]
    async fn existing_namespace_is_left_alone() {
        let server = MockApiServer::new();
        server.on("GET", "/api/v1/namespaces/argocd", 200, namespace_json("argocd"));

        let outcome = ensure_namespace(&server.client(), "argocd").await.unwrap();

        assert_eq!(outcome, Upsert::Exists);
        assert!(server.requests_matching("POST", "/api/v1/namespaces").is_empty());
    }

    #[tokio::test]
    async fn missing_namespace_is_created() {
        let server = MockApiServer::new();
        server.on(
            "GET",
            "/api/v1/namespaces/argocd",
            404,
            not_found_json("namespaces", "argocd"),
        );
        server.on("POST", "/api/v1/namespaces", 201, namespace_json("argocd"));

        let outcome = ensure_namespace(&server.client(), "argocd").await.unwrap();

        assert_eq!(outcome, Upsert::Created);
        let creates = server.requests_matching("POST", "/api/v1/namespaces");
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].body_json()["metadata"]["name"], "argocd");
    }

    #[tokio::test]
    async fn namespace_read_error_is_propagated() {
        let server = MockApiServer::new();
        server.on(
            "GET",
            "/api/v1/namespaces/argocd",
            500,
            r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"boom","reason":"InternalError","code":500}"#,
        );

        assert!(ensure_namespace(&server.client(), "argocd").await.is_err());
    }

    #[tokio::test]
    async fn missing_secret_is_created_with_labels() {
        let server = MockApiServer::new();
        server.on(
            "POST",
            "/api/v1/namespaces/argocd/secrets",
            201,
            object_json("v1", "Secret", "repo-creds", Some("argocd")),
        );

        let data = BTreeMap::from([("user".to_string(), "a".to_string())]);
        let labels = BTreeMap::from([("team".to_string(), "x".to_string())]);
        let outcome = ensure_secret(&server.client(), "repo-creds", "argocd", &data, Some(&labels))
            .await
            .unwrap();

        assert_eq!(outcome, Upsert::Created);
        let creates = server.requests_matching("POST", "/api/v1/namespaces/argocd/secrets");
        let body = creates[0].body_json();
        assert_eq!(body["stringData"]["user"], "a");
        assert_eq!(body["metadata"]["labels"]["team"], "x");
    }

    #[tokio::test]
    async fn existing_secret_is_patched_with_strategic_merge() {
        let server = MockApiServer::new();
        let existing = object_json("v1", "Secret", "repo-creds", Some("argocd"));
        server.on("GET", "/api/v1/namespaces/argocd/secrets/repo-creds", 200, existing.clone());
        server.on("PATCH", "/api/v1/namespaces/argocd/secrets/repo-creds", 200, existing);

        let data = BTreeMap::from([("pass".to_string(), "b".to_string())]);
        let outcome = ensure_secret(&server.client(), "repo-creds", "argocd", &data, None)
            .await
            .unwrap();

        assert_eq!(outcome, Upsert::Updated);
        let patches =
            server.requests_matching("PATCH", "/api/v1/namespaces/argocd/secrets/repo-creds");
        assert_eq!(patches.len(), 1);
        // Shallow key merge on stringData: only the supplied keys travel.
        assert_eq!(
            patches[0].content_type.as_deref(),
            Some("application/strategic-merge-patch+json")
        );
        assert_eq!(patches[0].body_json()["stringData"], json!({"pass": "b"}));
    }

    #[tokio::test]
    async fn config_map_values_are_coerced_to_strings() {
        let server = MockApiServer::new();
        server.on(
            "POST",
            "/api/v1/namespaces/argocd/configmaps",
            201,
            object_json("v1", "ConfigMap", "cluster-config", Some("argocd")),
        );

        let data = json!({
            "environment": "prod",
            "replicas": 3,
            "ha": true
        });
        let outcome = ensure_config_map(
            &server.client(),
            "cluster-config",
            "argocd",
            data.as_object().unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Upsert::Created);
        let creates = server.requests_matching("POST", "/api/v1/namespaces/argocd/configmaps");
        let body = creates[0].body_json();
        assert_eq!(body["data"]["environment"], "prod");
        assert_eq!(body["data"]["replicas"], "3");
        assert_eq!(body["data"]["ha"], "true");
    }

    #[test]
    fn coerce_string_keeps_compound_values_as_json() {
        assert_eq!(coerce_string(&json!("x")), "x");
        assert_eq!(coerce_string(&json!(5)), "5");
        assert_eq!(coerce_string(&json!(["a", "b"])), r#"["a","b"]"#);
    }
}
