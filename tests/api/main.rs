mod cross_protocol;
mod health_check;
mod helpers;
