use clap::{Parser, Subcommand};
use std::error::Error;
use wip_rust::wip_common_rs::clients::query_client::{QueryClient, QueryClientImpl};

#[derive(Parser)]
#[command(name = "wip-query")]
#[command(about = "WIP Query Client - 情報クエリサービス")]
#[command(version = "0.1.0")]
struct Cli {
    /// サーバーホスト
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// サーバーポート
    #[arg(short, long, default_value = "4111")]
    port: u16,

    /// デバッグモード
    #[arg(short, long)]
    debug: bool,

    /// 認証トークン
    #[arg(short, long)]
    auth_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// システム状態クエリ
    Status {
        /// 対象地域 (例: tokyo, osaka)
        #[arg(short, long)]
        region: Option<String>,

        /// 詳細情報を表示
        #[arg(short, long)]
        verbose: bool,
    },
    /// 気象警報クエリ
    Alerts {
        /// 対象地域
        #[arg(short, long)]
        region: Option<String>,

        /// 警報レベル (low, medium, high, critical)
        #[arg(short, long, default_value = "medium")]
        severity: String,

        /// アクティブな警報のみ
        #[arg(short = 'A', long)]
        active_only: bool,
    },
    /// 履歴データクエリ
    History {
        /// データタイプ (earthquake, tsunami, typhoon, flood, etc.)
        #[arg(short, long, default_value = "all")]
        data_type: String,

        /// 開始日 (YYYY-MM-DD)
        #[arg(short, long)]
        from: Option<String>,

        /// 終了日 (YYYY-MM-DD)
        #[arg(short, long)]
        to: Option<String>,

        /// 最大件数
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
    /// 予報データクエリ
    Forecast {
        /// 対象地域
        #[arg(short, long, default_value = "tokyo")]
        location: String,

        /// 期間 (1h, 3h, 24h, 3days, 7days)
        #[arg(short, long, default_value = "24h")]
        period: String,

        /// 詳細レベル (basic, detailed, extended)
        #[arg(short = 'D', long, default_value = "basic")]
        detail: String,
    },
    /// リソース情報クエリ
    Resources {
        /// リソースタイプ (shelter, evacuation, hospital, supply)
        #[arg(short, long, default_value = "shelter")]
        resource_type: String,

        /// 対象地域
        #[arg(short, long, default_value = "tokyo")]
        location: String,

        /// 検索半径 (km)
        #[arg(short = 'R', long, default_value = "5")]
        radius: f64,

        /// 利用可能なもののみ
        #[arg(short = 'v', long)]
        available_only: bool,
    },
    /// 統計情報クエリ
    Statistics {
        /// 統計タイプ (daily, weekly, monthly, yearly)
        #[arg(short, long, default_value = "daily")]
        stat_type: String,

        /// 対象メトリクス (requests, errors, weather_events, reports)
        #[arg(short, long, default_value = "requests")]
        metric: String,

        /// 対象期間（日数）
        #[arg(short, long, default_value = "7")]
        days: u32,
    },
    /// カスタムクエリ
    Custom {
        /// クエリタイプ
        query_type: String,

        /// クエリパラメータ (key=value&key2=value2 形式)
        parameters: String,

        /// レスポンス形式 (json, table, raw)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

fn format_query_response(query_type: &str, result: &std::collections::HashMap<String, serde_json::Value>, format: &str) {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string()));
        }
        "raw" => {
            println!("{:?}", result);
        }
        "table" | _ => {
            println!("=== {} クエリ結果 ===", query_type);
            
            if result.is_empty() {
                println!("データがありません");
                return;
            }
            
            for (key, value) in result {
                match value {
                    serde_json::Value::String(s) => println!("{}: {}", key, s),
                    serde_json::Value::Number(n) => println!("{}: {}", key, n),
                    serde_json::Value::Bool(b) => println!("{}: {}", key, b),
                    serde_json::Value::Array(arr) => {
                        println!("{}:", key);
                        for (i, item) in arr.iter().enumerate() {
                            println!("  {}: {}", i + 1, item);
                        }
                    }
                    serde_json::Value::Object(obj) => {
                        println!("{}:", key);
                        for (sub_key, sub_value) in obj {
                            println!("  {}: {}", sub_key, sub_value);
                        }
                    }
                    serde_json::Value::Null => println!("{}: null", key),
                }
            }
        }
    }
}

fn build_query_params(base_params: &str, additional: &[(&str, &str)]) -> String {
    let mut params = base_params.to_string();
    
    for (key, value) in additional {
        if !params.is_empty() {
            params.push('&');
        }
        params.push_str(&format!("{}={}", key, value));
    }
    
    params
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.debug {
        env_logger::init();
    }

    let server_addr = format!("{}:{}", cli.host, cli.port);
    let client = QueryClientImpl::new(&cli.host, cli.port).await?;

    if let Some(_token) = cli.auth_token {
        println!("⚠️ 認証トークン機能は現在実装中です");
    }

    match cli.command {
        Commands::Status { region, verbose } => {
            println!("🔍 システム状態をクエリ中...");
            
            let mut params = String::new();
            if let Some(region) = region {
                params = format!("region={}", region);
            }
            if verbose {
                if !params.is_empty() {
                    params.push('&');
                }
                params.push_str("verbose=true");
            }
            
            println!("⚠️ クエリ実行機能は現在実装中です");
            println!("パラメータ: {}", params);
            // TODO: Implement query execution with actual QueryRequest
        }

        Commands::Alerts { region, severity, active_only } => {
            println!("⚠️ 気象警報をクエリ中...");
            
            let mut params = format!("severity={}", severity);
            if let Some(region) = region {
                params = build_query_params(&params, &[("region", &region)]);
            }
            if active_only {
                params = build_query_params(&params, &[("active", "true")]);
            }
            
            println!("⚠️ 警報クエリ機能は現在実装中です");
            println!("パラメータ: {}", params);
        }

        Commands::History { data_type, from, to, limit } => {
            println!("📚 履歴データをクエリ中...");
            
            let mut params = format!("type={}&limit={}", data_type, limit);
            
            if let Some(from_date) = from {
                params = build_query_params(&params, &[("from", &from_date)]);
            }
            if let Some(to_date) = to {
                params = build_query_params(&params, &[("to", &to_date)]);
            }
            
            println!("⚠️ 履歴クエリ機能は現在実装中です");
            println!("パラメータ: {}", params);
        }

        Commands::Forecast { location, period, detail } => {
            println!("🔮 予報データをクエリ中...");
            
            let params = format!("location={}&period={}&detail={}", location, period, detail);
            
            println!("⚠️ 予報クエリ機能は現在実装中です");
            println!("パラメータ: {}", params);
        }

        Commands::Resources { resource_type, location, radius, available_only } => {
            println!("🏢 リソース情報をクエリ中...");
            
            let mut params = format!("type={}&location={}&radius={}", resource_type, location, radius);
            if available_only {
                params = build_query_params(&params, &[("available", "true")]);
            }
            
            println!("⚠️ リソースクエリ機能は現在実装中です");
            println!("パラメータ: {}", params);
        }

        Commands::Statistics { stat_type, metric, days } => {
            println!("📊 統計情報をクエリ中...");
            
            let params = format!("type={}&metric={}&days={}", stat_type, metric, days);
            
            println!("⚠️ 統計クエリ機能は現在実装中です");
            println!("パラメータ: {}", params);
        }

        Commands::Custom { query_type, parameters, format } => {
            println!("🔧 カスタムクエリを実行中...");
            println!("クエリタイプ: {}", query_type);
            println!("パラメータ: {}", parameters);
            
            println!("⚠️ カスタムクエリ機能は現在実装中です");
            println!("クエリタイプ: {}", query_type);
            println!("パラメータ: {}", parameters);
            println!("フォーマット: {}", format);
        }
    }

    Ok(())
}