use std::time::Duration;

use log::debug;
use reqwest::Url;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::IF_MATCH;

use super::DevPortalApi;
use super::http;
use crate::config::PortalConfig;
use crate::core::error::ApiError;
use crate::core::types::{
    Application, Certificate, CertificateCollection, CertificateDetails, KeyType, UpdateOptions,
};

const CERTIFICATE_FILE_NAME: &str = "certificate.pem";

/// `DevPortalApi` over the portal's REST endpoints.
pub struct RestPortalClient {
    base_url: Url,
    access_token: Option<String>,
    client: Client,
}

impl RestPortalClient {
    pub fn new(
        base_url: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ApiError::Transport(format!("invalid portal URL {base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Transport(format!(
                "portal URL cannot be used as a base: {base_url}"
            )));
        }
        Ok(Self {
            base_url,
            access_token,
            client: http::build_client(timeout),
        })
    }

    pub fn from_config(config: &PortalConfig) -> Result<Self, ApiError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| ApiError::Transport("portal base URL is not configured".into()))?;
        Self::new(base_url, config.access_token.clone(), config.timeout)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("invalid portal URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn certificates_url(&self, application_id: &str) -> Result<Url, ApiError> {
        self.endpoint(&["applications", application_id, "client-certificates"])
    }

    fn certificate_url(&self, application_id: &str, uuid: &str) -> Result<Url, ApiError> {
        self.endpoint(&["applications", application_id, "client-certificates", uuid])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl DevPortalApi for RestPortalClient {
    fn list_client_certificates(
        &self,
        application_id: &str,
    ) -> Result<CertificateCollection, ApiError> {
        let url = self.certificates_url(application_id)?;
        debug!("[portal-http] GET {url}");
        let response = self.authorize(self.client.get(url)).send()?;
        http::decode(response)
    }

    fn get_client_certificate(
        &self,
        application_id: &str,
        uuid: &str,
    ) -> Result<CertificateDetails, ApiError> {
        let url = self.certificate_url(application_id, uuid)?;
        debug!("[portal-http] GET {url}");
        let response = self.authorize(self.client.get(url)).send()?;
        http::decode(response)
    }

    fn add_client_certificate(
        &self,
        application_id: &str,
        content: &str,
        name: &str,
        key_type: &KeyType,
    ) -> Result<Certificate, ApiError> {
        let url = self.certificates_url(application_id)?;
        debug!("[portal-http] POST {url} name={name} keyType={key_type}");
        let form = Form::new()
            .part(
                "certificate",
                Part::text(content.to_string()).file_name(CERTIFICATE_FILE_NAME),
            )
            .text("name", name.to_string())
            .text("keyType", key_type.to_string());
        let response = self
            .authorize(self.client.post(url))
            .multipart(form)
            .send()?;
        http::decode(response)
    }

    fn delete_client_certificate(
        &self,
        application_id: &str,
        uuid: &str,
    ) -> Result<(), ApiError> {
        let url = self.certificate_url(application_id, uuid)?;
        debug!("[portal-http] DELETE {url}");
        let response = self.authorize(self.client.delete(url)).send()?;
        http::ensure_success(response)?;
        Ok(())
    }

    fn update_application(
        &self,
        application: &Application,
        options: Option<&UpdateOptions>,
    ) -> Result<Application, ApiError> {
        let url = self.endpoint(&["applications", application.application_id.as_str()])?;
        debug!("[portal-http] PUT {url}");
        let mut request = self.authorize(self.client.put(url)).json(application);
        if let Some(etag) = options.and_then(|options| options.if_match.as_deref()) {
            request = request.header(IF_MATCH, etag);
        }
        http::decode(request.send()?)
    }
}
