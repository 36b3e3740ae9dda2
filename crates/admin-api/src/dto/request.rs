//! 通用请求 DTO

use serde::{Deserialize, Deserializer};

/// 分页参数
///
/// page 从 1 开始，page_size 限制在 1-100 之间。
/// 查询串里的数字以字符串形式到达，被 `#[serde(flatten)]` 嵌入其他
/// 查询结构时 serde 不再做类型提示，因此这里同时接受整数与整数字符串。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page", deserialize_with = "lenient_i64")]
    pub page: i64,
    #[serde(default = "default_page_size", deserialize_with = "lenient_i64")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientI64;

    impl serde::de::Visitor<'_> for LenientI64 {
        type Value = i64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("整数或整数字符串")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(E::custom)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<i64, E> {
            v.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(LenientI64)
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    /// 规范化后的每页条数
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }

    /// SQL OFFSET 值
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.limit(), 20);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset_calculation() {
        let params = PaginationParams {
            page: 3,
            page_size: 10,
        };
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn test_clamps_out_of_range_values() {
        let params = PaginationParams {
            page: 0,
            page_size: 500,
        };
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 0);

        let params = PaginationParams {
            page: 2,
            page_size: 0,
        };
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 1);
    }

    /// 查询串中的显式分页参数必须能解析（数字以字符串到达）
    #[test]
    fn test_parses_explicit_query_params() {
        let uri: Uri = "/api/admin/notifications?page=2&pageSize=10"
            .parse()
            .unwrap();
        let Query(params) = Query::<PaginationParams>::try_from_uri(&uri).unwrap();
        assert_eq!(params.page, 2);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 10);
    }

    /// 非数字的分页参数应拒绝而不是静默回退默认值
    #[test]
    fn test_rejects_non_numeric_page() {
        let uri: Uri = "/api/admin/notifications?page=abc".parse().unwrap();
        assert!(Query::<PaginationParams>::try_from_uri(&uri).is_err());
    }
}
