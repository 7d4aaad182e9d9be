//! 测试共用的策略表

#![allow(dead_code)]

use ads_call_core::PolicyTable;

pub const CAMPAIGN_SERVICE: &str = "ads.v1.services.CampaignService";
pub const UPLOAD_SERVICE: &str = "ads.v1.services.ConversionUploadService";

/// 与生成的服务配置同形的 JSON 表
pub const POLICY_TABLE_JSON: &str = r#"{
  "interfaces": {
    "ads.v1.services.CampaignService": {
      "retry_codes": {
        "idempotent": ["DEADLINE_EXCEEDED", "UNAVAILABLE"],
        "non_idempotent": []
      },
      "retry_params": {
        "default": {
          "initial_retry_delay_millis": 5000,
          "retry_delay_multiplier": 1.3,
          "max_retry_delay_millis": 60000,
          "initial_rpc_timeout_millis": 3600000,
          "rpc_timeout_multiplier": 1.0,
          "max_rpc_timeout_millis": 3600000,
          "total_timeout_millis": 3600000
        }
      },
      "methods": {
        "GetCampaign": {
          "timeout_millis": 60000,
          "retry_codes_name": "idempotent",
          "retry_params_name": "default"
        },
        "MutateCampaigns": {
          "timeout_millis": 60000,
          "retry_codes_name": "non_idempotent",
          "retry_params_name": "default"
        }
      }
    },
    "ads.v1.services.ConversionUploadService": {
      "retry_codes": {
        "idempotent": ["DEADLINE_EXCEEDED", "UNAVAILABLE"],
        "non_idempotent": []
      },
      "retry_params": {
        "default": {
          "initial_retry_delay_millis": 5000,
          "retry_delay_multiplier": 1.3,
          "max_retry_delay_millis": 60000,
          "total_timeout_millis": 3600000
        }
      },
      "methods": {
        "UploadClickConversions": {
          "timeout_millis": 600000,
          "retry_codes_name": "non_idempotent",
          "retry_params_name": "default"
        }
      }
    }
  }
}"#;

pub fn sample_table() -> PolicyTable {
    PolicyTable::from_json_str(POLICY_TABLE_JSON).expect("sample table is valid")
}
