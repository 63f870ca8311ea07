// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route Prefix: none (/, /health, /log) and /api/auth/* for token acquisition
// Middleware: none beyond the global CORS and trace layers

pub mod auth;
pub mod system;
