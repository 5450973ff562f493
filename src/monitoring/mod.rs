pub mod forecast_chart;
pub mod traffic_monitoring_system;
