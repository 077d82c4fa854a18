//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use super::dto::{
    DiagnosticDto, FillChangeResponse, FillDto, FillListResponse, FillRequest, FillSummaryDto,
    FinishTripRequest, MeanDto, PartitionedDto, ReportResponse, SessionDto, StartTripRequest,
    TripChangeResponse, TripDto, TripEstimateDto, TripEstimateListResponse, TripListResponse,
    TripRequest, TripSummaryDto,
};
use super::handlers::system::{HealthResponse, StrategyInfo};
use super::handlers::{fills, report, system, trips};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "fuel-ledger",
        description = "Fuel fills, trips and derived consumption metrics."
    ),
    paths(
        fills::create_fill,
        fills::list_fills,
        fills::update_fill,
        fills::delete_fill,
        trips::create_trip,
        trips::list_trips,
        trips::update_trip,
        trips::delete_trip,
        trips::get_session,
        trips::start_trip,
        trips::finish_trip,
        trips::cancel_trip,
        report::get_report,
        report::get_trip_estimates,
        system::health_handler,
        system::strategies_handler,
    ),
    components(schemas(
        FillRequest,
        FillDto,
        FillListResponse,
        FillChangeResponse,
        TripRequest,
        TripDto,
        TripListResponse,
        TripChangeResponse,
        StartTripRequest,
        FinishTripRequest,
        SessionDto,
        ReportResponse,
        FillSummaryDto,
        TripSummaryDto,
        MeanDto,
        PartitionedDto,
        DiagnosticDto,
        TripEstimateDto,
        TripEstimateListResponse,
        HealthResponse,
        StrategyInfo,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Fills", description = "Fuel fill events"),
        (name = "Trips", description = "Recorded trips"),
        (name = "Trip session", description = "Start/finish trip flow"),
        (name = "Report", description = "Summary statistics and estimates"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;
