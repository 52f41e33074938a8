// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Catalog queries behind the protected routes.
//!
//! Each query lowercases its input, performs one catalog fetch and reduces
//! the document to a small response. Upstream classification is mapped to
//! client-facing errors here.

use anyhow::anyhow;
use rand::Rng;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::model::{MemberResponse, PokemonDocument, TypeDocument, TypesResponse};
use crate::upstream::{Catalog, UpstreamError};

const POKEMON_NOT_FOUND: &str = "pokemon not registered in catalog";
const TYPE_NOT_FOUND: &str = "type not found";
const TYPE_EMPTY: &str = "no pokemon of that type";
const UPSTREAM_DOWN: &str = "failed to connect to the pokemon catalog";

/// Source of uniform indices for random member selection.
pub trait MemberPicker: Send + Sync {
    /// Returns an index in `0..len`. Callers guarantee `len > 0`.
    fn pick(&self, len: usize) -> usize;
}

/// Thread-local RNG, unseeded.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl MemberPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Ordered type names of a single pokemon.
pub async fn get_types(catalog: &dyn Catalog, name: &str) -> Result<TypesResponse, AppError> {
    tracing::info!(name, "fetching pokemon types");

    let key = name.to_lowercase();
    let document: PokemonDocument = fetch(catalog, "pokemon", &key, POKEMON_NOT_FOUND).await?;

    let types: Vec<String> = document
        .types
        .into_iter()
        .map(|slot| slot.kind.name)
        .collect();

    tracing::info!(name, ?types, "resolved pokemon types");

    Ok(TypesResponse {
        name: name.to_string(),
        types,
    })
}

/// One member of the type, chosen by `picker`.
pub async fn get_random_by_type(
    catalog: &dyn Catalog,
    picker: &dyn MemberPicker,
    type_name: &str,
) -> Result<MemberResponse, AppError> {
    tracing::info!(type_name, "selecting random pokemon by type");

    let mut members = fetch_members(catalog, type_name).await?;
    let index = picker.pick(members.len());
    if index >= members.len() {
        return Err(AppError::Internal(anyhow!(
            "picker returned index {index} for {} members",
            members.len()
        )));
    }

    let name = members.swap_remove(index);
    tracing::info!(type_name, selected = %name, "selected random pokemon");

    Ok(MemberResponse { name })
}

/// The member with the longest name; the earliest one wins a tie.
pub async fn get_longest_name_by_type(
    catalog: &dyn Catalog,
    type_name: &str,
) -> Result<MemberResponse, AppError> {
    tracing::info!(type_name, "searching longest pokemon name by type");

    let members = fetch_members(catalog, type_name).await?;
    let name = longest_name(members).ok_or_else(|| AppError::not_found(TYPE_EMPTY))?;

    tracing::info!(type_name, selected = %name, "found longest pokemon name");

    Ok(MemberResponse { name })
}

fn longest_name(members: Vec<String>) -> Option<String> {
    let mut best: Option<(usize, String)> = None;
    for name in members {
        let len = name.chars().count();
        match &best {
            Some((best_len, _)) if len <= *best_len => {}
            _ => best = Some((len, name)),
        }
    }
    best.map(|(_, name)| name)
}

async fn fetch_members(catalog: &dyn Catalog, type_name: &str) -> Result<Vec<String>, AppError> {
    let key = type_name.to_lowercase();
    let document: TypeDocument = fetch(catalog, "type", &key, TYPE_NOT_FOUND).await?;

    if document.pokemon.is_empty() {
        tracing::warn!(type_name, "type has no members");
        return Err(AppError::not_found(TYPE_EMPTY));
    }

    Ok(document
        .pokemon
        .into_iter()
        .map(|member| member.pokemon.name)
        .collect())
}

async fn fetch<T: DeserializeOwned>(
    catalog: &dyn Catalog,
    kind: &str,
    key: &str,
    not_found: &str,
) -> Result<T, AppError> {
    let value = catalog.fetch_resource(kind, key).await.map_err(|err| match err {
        UpstreamError::ResourceNotFound { status } => {
            tracing::warn!(kind, key, %status, "catalog resource not found");
            AppError::not_found(not_found)
        }
        UpstreamError::Unavailable(detail) => {
            tracing::error!(kind, key, %detail, "catalog unreachable");
            AppError::upstream_unavailable(UPSTREAM_DOWN)
        }
        malformed @ UpstreamError::Malformed(_) => AppError::Internal(malformed.into()),
    })?;

    serde_json::from_value(value).map_err(|e| AppError::Internal(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::MockCatalog;
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    struct FixedPicker(usize);

    impl MemberPicker for FixedPicker {
        fn pick(&self, _len: usize) -> usize {
            self.0
        }
    }

    fn catalog_expecting(kind: &'static str, key: &'static str, response: Value) -> MockCatalog {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_resource()
            .withf(move |k, requested| k == kind && requested == key)
            .times(1)
            .returning(move |_, _| Ok(response.clone()));
        catalog
    }

    fn type_document(names: &[&str]) -> Value {
        let members: Vec<Value> = names
            .iter()
            .map(|name| json!({ "pokemon": { "name": name, "url": "" }, "slot": 1 }))
            .collect();
        json!({ "name": "electric", "pokemon": members })
    }

    #[tokio::test]
    async fn types_are_extracted_in_upstream_order() {
        let catalog = catalog_expecting(
            "pokemon",
            "charizard",
            json!({
                "name": "charizard",
                "types": [
                    { "slot": 1, "type": { "name": "fire" } },
                    { "slot": 2, "type": { "name": "flying" } }
                ]
            }),
        );

        let response = get_types(&catalog, "charizard").await.unwrap();
        assert_eq!(
            response,
            TypesResponse {
                name: "charizard".to_string(),
                types: vec!["fire".to_string(), "flying".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn lookup_key_is_lowercased_but_name_is_echoed() {
        let catalog = catalog_expecting(
            "pokemon",
            "pikachu",
            json!({ "types": [{ "type": { "name": "electric" } }] }),
        );

        let response = get_types(&catalog, "PiKaChU").await.unwrap();
        assert_eq!(response.name, "PiKaChU");
        assert_eq!(response.types, vec!["electric".to_string()]);
    }

    #[tokio::test]
    async fn separators_stay_inside_the_lookup_key() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_resource()
            .withf(|kind, key| kind == "pokemon" && key == "../berry/1?x=1")
            .times(1)
            .returning(|_, _| {
                Err(UpstreamError::ResourceNotFound {
                    status: StatusCode::NOT_FOUND,
                })
            });

        let err = get_types(&catalog, "../Berry/1?x=1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn any_non_success_status_is_not_found() {
        for status in [StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR] {
            let mut catalog = MockCatalog::new();
            catalog
                .expect_fetch_resource()
                .returning(move |_, _| Err(UpstreamError::ResourceNotFound { status }));

            let err = get_types(&catalog, "notapokemon").await.unwrap_err();
            assert!(matches!(err, AppError::NotFound(ref m) if m == POKEMON_NOT_FOUND));
        }
    }

    #[tokio::test]
    async fn unreachable_upstream_is_unavailable() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_resource()
            .returning(|_, _| Err(UpstreamError::Unavailable("connection refused".into())));

        let err = get_longest_name_by_type(&catalog, "electric").await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn missing_types_field_is_internal() {
        let catalog = catalog_expecting("pokemon", "missingno", json!({ "name": "missingno" }));

        let err = get_types(&catalog, "missingno").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("types"));
    }

    #[tokio::test]
    async fn random_selection_uses_injected_picker() {
        let catalog = catalog_expecting("type", "electric", type_document(&["a", "b", "c"]));

        let response = get_random_by_type(&catalog, &FixedPicker(2), "Electric")
            .await
            .unwrap();
        assert_eq!(response.name, "c");
    }

    #[tokio::test]
    async fn out_of_range_pick_is_internal() {
        let catalog = catalog_expecting("type", "electric", type_document(&["a"]));

        let err = get_random_by_type(&catalog, &FixedPicker(5), "electric")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn empty_type_is_not_found() {
        let catalog = catalog_expecting("type", "shadow", type_document(&[]));

        let err = get_random_by_type(&catalog, &RandomPicker, "shadow")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == TYPE_EMPTY));
    }

    #[tokio::test]
    async fn unknown_type_is_not_found() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_fetch_resource()
            .withf(|kind, key| kind == "type" && key == "plasma")
            .returning(|_, _| {
                Err(UpstreamError::ResourceNotFound {
                    status: StatusCode::NOT_FOUND,
                })
            });

        let err = get_longest_name_by_type(&catalog, "PLASMA").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == TYPE_NOT_FOUND));
    }

    #[tokio::test]
    async fn longest_name_is_selected() {
        let catalog = catalog_expecting(
            "type",
            "electric",
            type_document(&["pikachu", "raichu", "toxtricity-low-key-gmax"]),
        );

        let response = get_longest_name_by_type(&catalog, "electric").await.unwrap();
        assert_eq!(response.name, "toxtricity-low-key-gmax");
    }

    #[test]
    fn longest_name_ties_go_to_first_member() {
        let members = ["abc", "xyzw", "pqrs", "de"].map(String::from).to_vec();
        assert_eq!(longest_name(members).as_deref(), Some("xyzw"));
        assert_eq!(longest_name(Vec::new()), None);
    }

    #[test]
    fn random_picker_stays_in_range() {
        for _ in 0..200 {
            assert!(RandomPicker.pick(3) < 3);
        }
    }
}
