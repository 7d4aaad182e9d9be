//! 可重试状态码集合

use serde::Deserialize;
use tonic::Code;

use crate::error::ConfigError;

const CODE_NAMES: &[(&str, Code)] = &[
    ("OK", Code::Ok),
    ("CANCELLED", Code::Cancelled),
    ("UNKNOWN", Code::Unknown),
    ("INVALID_ARGUMENT", Code::InvalidArgument),
    ("DEADLINE_EXCEEDED", Code::DeadlineExceeded),
    ("NOT_FOUND", Code::NotFound),
    ("ALREADY_EXISTS", Code::AlreadyExists),
    ("PERMISSION_DENIED", Code::PermissionDenied),
    ("RESOURCE_EXHAUSTED", Code::ResourceExhausted),
    ("FAILED_PRECONDITION", Code::FailedPrecondition),
    ("ABORTED", Code::Aborted),
    ("OUT_OF_RANGE", Code::OutOfRange),
    ("UNIMPLEMENTED", Code::Unimplemented),
    ("INTERNAL", Code::Internal),
    ("UNAVAILABLE", Code::Unavailable),
    ("DATA_LOSS", Code::DataLoss),
    ("UNAUTHENTICATED", Code::Unauthenticated),
];

/// 将规范名称（如 `UNAVAILABLE`）解析为状态码，大小写不敏感
pub fn code_from_name(name: &str) -> Option<Code> {
    CODE_NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
        .map(|(_, code)| *code)
}

/// 状态码的规范名称
pub fn code_name(code: Code) -> &'static str {
    CODE_NAMES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(n, _)| *n)
        .unwrap_or("UNKNOWN")
}

/// 一个命名重试组中的状态码集合
///
/// 空集合表示该方法永不重试（非幂等写操作）
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct RetryCodes {
    codes: Vec<Code>,
}

impl RetryCodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_codes(codes: impl IntoIterator<Item = Code>) -> Self {
        let mut set = Self::new();
        for code in codes {
            set.insert(code);
        }
        set
    }

    /// 幂等方法的默认重试组：DEADLINE_EXCEEDED 与 UNAVAILABLE
    pub fn idempotent() -> Self {
        Self::from_codes([Code::DeadlineExceeded, Code::Unavailable])
    }

    pub fn insert(&mut self, code: Code) {
        if !self.codes.contains(&code) {
            self.codes.push(code);
        }
    }

    pub fn contains(&self, code: Code) -> bool {
        self.codes.contains(&code)
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Code> + '_ {
        self.codes.iter().copied()
    }
}

impl TryFrom<Vec<String>> for RetryCodes {
    type Error = ConfigError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        let mut set = Self::new();
        for name in names {
            let code = code_from_name(&name).ok_or(ConfigError::UnknownStatusCode(name))?;
            set.insert(code);
        }
        Ok(set)
    }
}
