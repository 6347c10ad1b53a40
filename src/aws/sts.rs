// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! EKS bearer token generation via a presigned STS request.
//!
//! The token is not a JWT: it is a base64url-encoded presigned
//! GetCallerIdentity URL that the API server re-executes against STS to
//! verify the caller's identity. The `x-k8s-aws-id` header scopes the
//! token to one cluster.

use crate::constants::token;
use crate::error::{BootstrapError, Result};
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SignatureLocation, SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::time::{Duration, SystemTime};

const CLUSTER_ID_HEADER: &str = "x-k8s-aws-id";

/// Build a bearer token for the named cluster.
///
/// The presign window is 60 seconds; the resulting token stays valid for
/// roughly [`token::VALIDITY_MINS`] minutes on the cluster side. Signing
/// errors are fatal to the invocation, credentials are environment-provided
/// and not retried.
pub fn request_token(
    credentials: &Credentials,
    cluster_name: &str,
    region: &str,
    now: SystemTime,
) -> Result<String> {
    let url = presigned_caller_identity_url(credentials, cluster_name, region, now)?;
    Ok(encode_token(&url))
}

/// Presign the fixed, non-mutating GetCallerIdentity call with the
/// signature carried in query parameters.
fn presigned_caller_identity_url(
    credentials: &Credentials,
    cluster_name: &str,
    region: &str,
    now: SystemTime,
) -> Result<String> {
    let mut settings = SigningSettings::default();
    settings.signature_location = SignatureLocation::QueryParams;
    settings.expires_in = Some(Duration::from_secs(token::STS_EXPIRES_SECS));

    let identity: Identity = credentials.clone().into();
    let params = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name("sts")
        .time(now)
        .settings(settings)
        .build()
        .map_err(|e| BootstrapError::TokenSigning(e.to_string()))?
        .into();

    let url = format!(
        "https://sts.{}.amazonaws.com/?Action=GetCallerIdentity&Version=2011-06-15",
        region
    );
    let headers = [(CLUSTER_ID_HEADER, cluster_name)];
    let signable = SignableRequest::new(
        "GET",
        url.as_str(),
        headers.iter().map(|(k, v)| (*k, *v)),
        SignableBody::Bytes(b""),
    )
    .map_err(|e| BootstrapError::TokenSigning(e.to_string()))?;

    let (instructions, _signature) = sign(signable, &params)
        .map_err(|e| BootstrapError::TokenSigning(e.to_string()))?
        .into_parts();

    let mut request = http::Request::builder()
        .method("GET")
        .uri(url.as_str())
        .header(CLUSTER_ID_HEADER, cluster_name)
        .body(())
        .map_err(|e| BootstrapError::TokenSigning(e.to_string()))?;
    instructions.apply_to_request_http1x(&mut request);

    Ok(request.uri().to_string())
}

fn encode_token(presigned_url: &str) -> String {
    format!(
        "{}{}",
        token::PREFIX,
        URL_SAFE_NO_PAD.encode(presigned_url.as_bytes())
    )
}
