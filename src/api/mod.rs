//! HTTP 层：路由处理函数和中间件

pub mod constants;
pub mod middleware;
pub mod services;
