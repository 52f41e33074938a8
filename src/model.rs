// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Request/response bodies and the subset of upstream documents we read.

use serde::{Deserialize, Serialize};

/// `{name, url}` reference as used throughout the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedResource {
    pub name: String,
}

/// `GET pokemon/{name}`: only the ordered type slots are read.
#[derive(Debug, Deserialize)]
pub struct PokemonDocument {
    pub types: Vec<TypeSlot>,
}

#[derive(Debug, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

/// `GET type/{name}`: the member list of a type group.
#[derive(Debug, Deserialize)]
pub struct TypeDocument {
    pub pokemon: Vec<TypeMember>,
}

#[derive(Debug, Deserialize)]
pub struct TypeMember {
    pub pokemon: NamedResource,
}

/// Login body. Fields are optional so absence maps to 400, not a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypesResponse {
    pub name: String,
    pub types: Vec<String>,
}

/// Single selected member. Serialized as `nombre` for client compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberResponse {
    #[serde(rename = "nombre")]
    pub name: String,
}
