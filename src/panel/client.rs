//! Thin HTTP client for the remote render service.
//!
//! The service owns all actual ray tracing; this side only posts camera
//! poses and reads back status and finished frames. Everything network-y is
//! behind the [`RenderService`] trait so the coordinator and poller can be
//! driven against a scripted fake in tests.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::panel::camera::CameraPose;

/// One camera update for the service: the pose plus whether a fast preview
/// pass is enough or a full-quality pass is wanted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub pose: CameraPose,
    pub quick_render: bool,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("render service returned {status} for /{endpoint}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("unexpected render status payload: {0}")]
    Body(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// The three remote operations of the render service.
pub trait RenderService {
    fn update_camera(&self, request: &RenderRequest) -> Result<(), ClientError>;

    /// Whether the service is currently computing a frame.
    fn render_status(&self) -> Result<bool, ClientError>;

    /// Raw encoded bytes of the most recently completed frame.
    fn fetch_frame(&self) -> Result<Vec<u8>, ClientError>;
}

/// Query-string shape of `POST /camera`, field names as the service expects
/// them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CameraQuery {
    eye_x: f64,
    eye_y: f64,
    eye_z: f64,
    look_at_x: f64,
    look_at_y: f64,
    look_at_z: f64,
    quick_render: bool,
}

impl CameraQuery {
    fn from_request(request: &RenderRequest) -> Self {
        let CameraPose { eye, look_at } = request.pose;
        Self {
            eye_x: eye.x,
            eye_y: eye.y,
            eye_z: eye.z,
            look_at_x: look_at.x,
            look_at_y: look_at.y,
            look_at_z: look_at.z,
            quick_render: request.quick_render,
        }
    }
}

pub struct HttpRenderClient {
    http: reqwest::blocking::Client,
    base: String,
}

impl HttpRenderClient {
    /// `base` is the service mount point, e.g. `http://host:8080/api/raytracer`.
    pub fn new(base: &str) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn camera_request(&self, request: &RenderRequest) -> reqwest::blocking::RequestBuilder {
        self.http
            .post(self.endpoint("camera"))
            .query(&CameraQuery::from_request(request))
    }
}

impl RenderService for HttpRenderClient {
    fn update_camera(&self, request: &RenderRequest) -> Result<(), ClientError> {
        let response = self.camera_request(request).send()?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: "camera",
                status: response.status(),
            });
        }
        // The body is an opaque acknowledgement string; nothing to read.
        Ok(())
    }

    fn render_status(&self) -> Result<bool, ClientError> {
        let response = self.http.get(self.endpoint("status")).send()?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: "status",
                status: response.status(),
            });
        }

        let value: serde_json::Value = response.json()?;
        coerce_status(&value).ok_or_else(|| ClientError::Body(value.to_string()))
    }

    fn fetch_frame(&self) -> Result<Vec<u8>, ClientError> {
        let response = self.http.get(self.endpoint("render")).send()?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: "render",
                status: response.status(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Accepts a bare JSON boolean or an object carrying a boolean `rendering`
/// field.
fn coerce_status(value: &serde_json::Value) -> Option<bool> {
    value
        .as_bool()
        .or_else(|| value.get("rendering").and_then(serde_json::Value::as_bool))
}
