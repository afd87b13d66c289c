pub mod colaborador_routes;
pub mod system_routes;

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::ApiError;

/// One public endpoint, as advertised by `/`, `/api/info` and the 404
/// envelope.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint { method: "GET", path: "/", description: "Service banner" },
    Endpoint { method: "GET", path: "/health", description: "Health check" },
    Endpoint { method: "GET", path: "/api/status", description: "Runtime status" },
    Endpoint { method: "GET", path: "/api/info", description: "API metadata" },
    Endpoint { method: "GET", path: "/api/colaboradores", description: "List colaboradores" },
    Endpoint { method: "GET", path: "/api/colaboradores/:id", description: "Get colaborador by id" },
    Endpoint { method: "POST", path: "/api/colaboradores", description: "Create colaborador" },
    Endpoint { method: "PUT", path: "/api/colaboradores/:id", description: "Update colaborador" },
    Endpoint { method: "DELETE", path: "/api/colaboradores/:id", description: "Delete colaborador" },
    Endpoint {
        method: "GET",
        path: "/api/colaboradores/departamento/:departamento",
        description: "List colaboradores of a department",
    },
];

/// `axum::Json` whose rejections become `ApiError::MalformedJson`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path` whose rejections become `ApiError::InvalidPath`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);
