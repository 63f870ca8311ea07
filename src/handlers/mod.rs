// handlers/mod.rs - HTTP handlers by access tier
//
// Public (no auth) → Protected (JWT + per-handler role gate)
pub mod protected; // /api/v1/*: ReadAccess for queries, AdminAccess for changes
pub mod public; // /, /health, /log, /api/auth/login
