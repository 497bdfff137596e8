// src/api.rs
use log::{error, info};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::error::{handle_rejection, PortfolioError};
use crate::models::StockFields;
use crate::service::PortfolioService;

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    service: PortfolioService,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("api" / "stocks")
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(list_stocks_handler);

    let add = warp::path!("api" / "stocks")
        .and(warp::post())
        .and(with_service(service.clone()))
        .and(stock_body())
        .and_then(add_stock_handler);

    let update = warp::path!("api" / "stocks" / i64)
        .and(warp::put())
        .and(with_service(service.clone()))
        .and(stock_body())
        .and_then(update_stock_handler);

    let delete = warp::path!("api" / "stocks" / i64)
        .and(warp::delete())
        .and(with_service(service))
        .and_then(delete_stock_handler);

    list.or(add)
        .or(update)
        .or(delete)
        .recover(handle_rejection)
        .with(cors())
        .with(warp::log("portfolio_tracker::api"))
}

/// Any origin may call the four stock methods.
pub fn cors() -> warp::cors::Builder {
    warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allow_header("content-type")
}

fn with_service(
    service: PortfolioService,
) -> impl Filter<Extract = (PortfolioService,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || service.clone())
}

fn stock_body() -> impl Filter<Extract = (StockFields,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn reject(e: PortfolioError) -> Rejection {
    warp::reject::custom(e)
}

async fn list_stocks_handler(service: PortfolioService) -> Result<impl Reply, Rejection> {
    match service.list_all().await {
        Ok(stocks) => Ok(warp::reply::json(&stocks)),
        Err(e) => {
            error!("Failed to list stocks: {}", e);
            Err(reject(e))
        }
    }
}

async fn add_stock_handler(
    service: PortfolioService,
    fields: StockFields,
) -> Result<impl Reply, Rejection> {
    match service.add(fields).await {
        Ok(stock) => Ok(warp::reply::with_status(
            warp::reply::json(&stock),
            StatusCode::CREATED,
        )),
        Err(e) => {
            error!("Failed to add stock: {}", e);
            Err(reject(e))
        }
    }
}

async fn update_stock_handler(
    id: i64,
    service: PortfolioService,
    fields: StockFields,
) -> Result<impl Reply, Rejection> {
    match service.update(id, fields).await {
        Ok(stock) => Ok(warp::reply::json(&stock)),
        Err(e @ PortfolioError::NotFound(_)) => {
            info!("Rejected update: {}", e);
            Err(reject(e))
        }
        Err(e) => {
            error!("Failed to update stock {}: {}", id, e);
            Err(reject(e))
        }
    }
}

async fn delete_stock_handler(id: i64, service: PortfolioService) -> Result<impl Reply, Rejection> {
    match service.delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete stock {}: {}", id, e);
            Err(reject(e))
        }
    }
}
