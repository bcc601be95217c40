pub mod agent_service;
pub mod analytics_service;
pub mod auth_service;
pub mod business_service;
pub mod insights;
pub mod monitoring_service;
pub mod token_service;
pub mod uptime_monitor;
