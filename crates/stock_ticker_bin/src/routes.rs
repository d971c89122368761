use actix_web::{HttpResponse, Responder, web};
use log::error;
use serde::Serialize;
use ticker_cache::StockTickerCache;

#[derive(Serialize)]
struct StatusResponse {
    status: String,
}

impl StatusResponse {
    fn new(status: &str) -> Self {
        StatusResponse {
            status: status.to_string(),
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/stock-info")
            .route(web::get().to(get_stock_info))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/healthz")
            .route(web::get().to(healthcheck))
            .default_service(web::to(method_not_allowed)),
    );
}

async fn get_stock_info(cache: web::Data<StockTickerCache>) -> HttpResponse {
    match cache.get_snapshot().await {
        Ok(snapshot) => HttpResponse::Ok().json(&*snapshot),
        Err(e) => {
            error!(
                "get_stock_info | error from stock ticker cache | symbol: {} | error: {}",
                cache.settings().symbol,
                e
            );
            HttpResponse::InternalServerError().json(StatusResponse::new("internal server error"))
        }
    }
}

async fn healthcheck() -> impl Responder {
    web::Json(StatusResponse::new("ok"))
}

async fn method_not_allowed() -> impl Responder {
    HttpResponse::MethodNotAllowed().json(StatusResponse::new("method not allowed"))
}

pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(StatusResponse::new("not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ticker_cache::CacheSettings;
    use ticker_model::{
        DailyAdjustedResponse, Metadata, RawDailyEntry, UpstreamClient, UpstreamError,
    };

    struct FakeUpstream {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeUpstream {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(FakeUpstream {
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl UpstreamClient for FakeUpstream {
        async fn fetch_daily_adjusted(
            &self,
            symbol: &str,
        ) -> Result<DailyAdjustedResponse, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(UpstreamError::new("connection reset"));
            }

            let series = (1..=5)
                .map(|day| {
                    let close = format!("{}.00", day);
                    let entry = RawDailyEntry {
                        open: close.clone(),
                        high: close.clone(),
                        low: close.clone(),
                        close,
                        adjusted_close: None,
                        volume: 1000 * day,
                        dividend_amount: None,
                        split_coefficient: None,
                    };
                    (format!("2024-01-0{}", day), entry)
                })
                .collect();

            Ok(DailyAdjustedResponse {
                metadata: Metadata {
                    information: String::new(),
                    symbol: symbol.to_string(),
                    last_refreshed: "2024-01-05".to_string(),
                    output_size: "Compact".to_string(),
                    timezone: "US/Eastern".to_string(),
                },
                series,
            })
        }
    }

    fn cache_with(upstream: Arc<FakeUpstream>) -> web::Data<StockTickerCache> {
        let settings = CacheSettings::new("ABC", NonZeroUsize::new(3).unwrap());
        web::Data::new(StockTickerCache::new(settings, upstream))
    }

    macro_rules! app {
        ($cache:expr) => {
            test::init_service(
                App::new()
                    .app_data($cache.clone())
                    .configure(configure)
                    .default_service(web::to(not_found)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn stock_info_returns_snapshot() {
        let upstream = FakeUpstream::new(false);
        let cache = cache_with(upstream.clone());
        let app = app!(cache);

        let req = test::TestRequest::get().uri("/api/stock-info").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["symbol"], "ABC");
        assert_eq!(body["days"], 3);
        assert_eq!(body["average_closing_price"], "4.00");
        let closes: Vec<&str> = body["stock_time_series"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["close"].as_str().unwrap())
            .collect();
        assert_eq!(closes, vec!["5.00", "4.00", "3.00"]);
        assert!(body["last_refreshed"].is_string());
    }

    #[actix_web::test]
    async fn stock_info_second_request_is_cached() {
        let upstream = FakeUpstream::new(false);
        let cache = cache_with(upstream.clone());
        let app = app!(cache);

        for _ in 0..3 {
            let req = test::TestRequest::get().uri("/api/stock-info").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn stock_info_maps_core_error_to_500() {
        let cache = cache_with(FakeUpstream::new(true));
        let app = app!(cache);

        let req = test::TestRequest::get().uri("/api/stock-info").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "internal server error");
    }

    #[actix_web::test]
    async fn stock_info_rejects_post() {
        let upstream = FakeUpstream::new(false);
        let cache = cache_with(upstream.clone());
        let app = app!(cache);

        let req = test::TestRequest::post().uri("/api/stock-info").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn healthz_reports_ok() {
        let cache = cache_with(FakeUpstream::new(true));
        let app = app!(cache);

        let req = test::TestRequest::get().uri("/healthz").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");

        let req = test::TestRequest::delete().uri("/healthz").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[actix_web::test]
    async fn unknown_path_is_not_found() {
        let cache = cache_with(FakeUpstream::new(false));
        let app = app!(cache);

        let req = test::TestRequest::get().uri("/api/other").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
