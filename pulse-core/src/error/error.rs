
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryErr>;

/// 单次注册中心调用失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// 注册中心返回了非预期的状态码
    #[error("unexpected status {0}")]
    Status(u16),

    /// 连接失败、超时或取消
    #[error("transport error: {0}")]
    Transport(String),
}

/// 注册中心操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Register,
    Deregister,
    Heartbeat,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Register => f.write_str("register"),
            Operation::Deregister => f.write_str("deregister"),
            Operation::Heartbeat => f.write_str("heartbeat"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryErr {
    #[error("register failed: {0}")]
    Registration(Failure),

    #[error("deregister failed: {0}")]
    Deregistration(Failure),

    #[error("heartbeat failed: {0}")]
    Heartbeat(Failure),

    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    // 状态错误
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl RegistryErr {
    /// 按操作类型包装失败原因
    pub fn for_operation(op: Operation, failure: Failure) -> Self {
        match op {
            Operation::Register => RegistryErr::Registration(failure),
            Operation::Deregister => RegistryErr::Deregistration(failure),
            Operation::Heartbeat => RegistryErr::Heartbeat(failure),
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            RegistryErr::Registration(_) => Some(Operation::Register),
            RegistryErr::Deregistration(_) => Some(Operation::Deregister),
            RegistryErr::Heartbeat(_) => Some(Operation::Heartbeat),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            RegistryErr::Registration(f)
            | RegistryErr::Deregistration(f)
            | RegistryErr::Heartbeat(f) => Some(f),
            _ => None,
        }
    }

    /// 注册中心返回的状态码（仅状态码不匹配时存在）
    pub fn status(&self) -> Option<u16> {
        match self.failure() {
            Some(Failure::Status(code)) => Some(*code),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.failure(), Some(Failure::Transport(_)))
    }

    // 错误转换辅助方法
    pub fn invalid_instance(msg: impl Into<String>) -> Self {
        RegistryErr::InvalidInstance(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        RegistryErr::InvalidConfig(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        RegistryErr::InvalidState(msg.into())
    }
}

impl Failure {
    pub fn transport(msg: impl Into<String>) -> Self {
        Failure::Transport(msg.into())
    }

    pub fn cancelled() -> Self {
        Failure::Transport("request cancelled".to_string())
    }
}
