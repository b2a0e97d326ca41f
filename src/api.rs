//! JSON request handling for the projection and planning endpoints
//!
//! Handlers take the raw request body and return an [`ApiResponse`] with an
//! HTTP status and a `{success, ...}` envelope. Transport (Lambda, CLI) is
//! left to the caller.

use chrono::Utc;
use log::{error, warn};
use serde::Serialize;
use serde_json::{json, Value};

use crate::catalog::{InvestmentOption, OptionRepository, RiskTolerance};
use crate::conversions::{record_click, ConversionStore, InMemoryConversionStore};
use crate::error::{ConversionError, ProjectionError};
use crate::planning::{GoalPlan, GoalPlanner};
use crate::projection::{ProjectionEngine, ProjectionInput, ProjectionResult};

const MISSING_PARAMS: &str = "Faltan parámetros requeridos";

/// Status code and JSON body of a handled request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(data: impl Serialize) -> Self {
        Self {
            status: 200,
            body: json!({ "success": true, "data": data }),
        }
    }

    fn failure(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "success": false, "message": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Month row of a projection response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthRow {
    mes: u32,
    saldo: f64,
    intereses_mes: f64,
    aporte_mes: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionData {
    monto_final: f64,
    total_aportado: f64,
    total_intereses: f64,
    rendimiento_total: f64,
    proyeccion_mensual: Vec<MonthRow>,
}

impl From<ProjectionResult> for ProjectionData {
    fn from(result: ProjectionResult) -> Self {
        Self {
            monto_final: result.final_balance,
            total_aportado: result.total_contributed,
            total_intereses: result.total_interest,
            rendimiento_total: result.total_return_percent,
            proyeccion_mensual: result
                .schedule
                .into_iter()
                .map(|e| MonthRow {
                    mes: e.month,
                    saldo: e.balance,
                    intereses_mes: e.interest_this_month,
                    aporte_mes: e.contribution_this_month,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanRow {
    opcion_id: u32,
    nombre: String,
    institucion: String,
    tasa_anual: f64,
    nivel_riesgo: &'static str,
    aportes_mensuales: f64,
    monto_final: f64,
    alcanza_meta: bool,
    excedente: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanData {
    monto_actual: f64,
    monto_meta: f64,
    meses_plazo: u32,
    planes: Vec<PlanRow>,
}

/// Catalog record as exposed to clients
#[derive(Debug, Serialize)]
struct OptionRow {
    id: u32,
    nombre: String,
    tipo: String,
    institucion: String,
    tasa_anual: f64,
    monto_minimo: f64,
    plazo_minimo_dias: u32,
    nivel_riesgo: &'static str,
    liquidez: &'static str,
    descripcion: String,
    url_afiliado: String,
    comision_referido: f64,
    destacado: bool,
}

impl From<InvestmentOption> for OptionRow {
    fn from(o: InvestmentOption) -> Self {
        Self {
            id: o.id,
            nombre: o.name,
            tipo: o.kind,
            institucion: o.institution,
            tasa_anual: o.annual_rate_percent,
            monto_minimo: o.minimum_amount,
            plazo_minimo_dias: o.minimum_term_days,
            nivel_riesgo: o.risk_level.as_str(),
            liquidez: o.liquidity.as_str(),
            descripcion: o.description,
            url_afiliado: o.affiliate_url,
            comision_referido: o.referral_commission,
            destacado: o.featured,
        }
    }
}

fn parse_body(body: &str) -> Result<Value, ApiResponse> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        warn!("rejected malformed request body: {}", e);
        ApiResponse::failure(400, "Cuerpo de la petición inválido")
    })?;
    if !value.is_object() {
        return Err(ApiResponse::failure(400, "Cuerpo de la petición inválido"));
    }
    Ok(value)
}

/// Read a numeric field given as a JSON number or numeric string.
/// Absent, null and empty-string values read as `None`.
fn number_field(body: &Value, name: &str) -> Result<Option<f64>, ApiResponse> {
    let invalid = || ApiResponse::failure(400, &format!("El parámetro {} debe ser numérico", name));

    match body.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn required_number(body: &Value, name: &str) -> Result<f64, ApiResponse> {
    number_field(body, name)?.ok_or_else(|| {
        warn!("request missing required parameter {}", name);
        ApiResponse::failure(400, MISSING_PARAMS)
    })
}

fn required_months(body: &Value, name: &str) -> Result<u32, ApiResponse> {
    let months = required_number(body, name)?;
    if !months.is_finite() || months < 0.0 || months.fract() != 0.0 {
        return Err(ApiResponse::failure(
            400,
            &format!("El parámetro {} debe ser un número entero de meses", name),
        ));
    }
    // Oversized horizons saturate and are rejected by the engine's ceiling
    Ok(months.min(u32::MAX as f64) as u32)
}

fn engine_failure(err: ProjectionError, context: &str) -> ApiResponse {
    if err.is_client_error() {
        warn!("{}: {}", context, err);
        ApiResponse::failure(400, &err.to_string())
    } else {
        error!("{}: {}", context, err);
        ApiResponse::failure(500, context)
    }
}

/// `POST /api/calcular/proyeccion`
pub fn handle_projection(engine: &ProjectionEngine, body: &str) -> ApiResponse {
    let request = match parse_projection_request(body) {
        Ok(input) => input,
        Err(response) => return response,
    };

    match engine.project(&request) {
        Ok(result) => ApiResponse::ok(ProjectionData::from(result)),
        Err(err) => engine_failure(err, "Error al calcular proyección"),
    }
}

fn parse_projection_request(body: &str) -> Result<ProjectionInput, ApiResponse> {
    let body = parse_body(body)?;
    let initial_amount = required_number(&body, "montoInicial")?;
    let annual_rate_percent = required_number(&body, "tasaAnual")?;
    let horizon_months = required_months(&body, "meses")?;
    let monthly_contribution = number_field(&body, "aportesMensuales")?.unwrap_or(0.0);

    Ok(ProjectionInput::new(
        initial_amount,
        monthly_contribution,
        annual_rate_percent,
        horizon_months,
    ))
}

/// `POST /api/calcular/plan`
pub fn handle_plan(planner: &GoalPlanner, repository: &dyn OptionRepository, body: &str) -> ApiResponse {
    let goal = match parse_plan_request(body) {
        Ok(goal) => goal,
        Err(response) => return response,
    };

    let plans = match planner.plan(&goal, repository) {
        Ok(plans) => plans,
        Err(err) => return engine_failure(err, "Error al calcular plan personalizado"),
    };

    let planes = plans
        .into_iter()
        .map(|(option, result)| PlanRow {
            opcion_id: result.option_id,
            nombre: option.name,
            institucion: option.institution,
            tasa_anual: option.annual_rate_percent,
            nivel_riesgo: option.risk_level.as_str(),
            aportes_mensuales: result.required_monthly_contribution,
            monto_final: result.projected_final_balance,
            alcanza_meta: result.reaches_target,
            excedente: result.surplus,
        })
        .collect();

    ApiResponse::ok(PlanData {
        monto_actual: goal.current_amount,
        monto_meta: goal.target_amount,
        meses_plazo: goal.horizon_months,
        planes,
    })
}

fn parse_plan_request(body: &str) -> Result<GoalPlan, ApiResponse> {
    let body = parse_body(body)?;
    let current_amount = required_number(&body, "montoActual")?;
    let target_amount = required_number(&body, "montoMeta")?;
    let horizon_months = required_months(&body, "mesesPlazo")?;
    let risk_tolerance = RiskTolerance::parse(body.get("toleranciaRiesgo").and_then(Value::as_str));

    Ok(GoalPlan {
        current_amount,
        target_amount,
        horizon_months,
        risk_tolerance,
    })
}

/// `GET /api/opciones`
pub fn handle_list_options(repository: &dyn OptionRepository) -> ApiResponse {
    let options: Vec<OptionRow> = repository.list_active().into_iter().map(OptionRow::from).collect();
    ApiResponse {
        status: 200,
        body: json!({ "success": true, "count": options.len(), "data": options }),
    }
}

/// `GET /api/opciones/{id}`
pub fn handle_get_option(repository: &dyn OptionRepository, id: &str) -> ApiResponse {
    match id.parse::<u32>().ok().and_then(|id| repository.get(id)) {
        Some(option) => ApiResponse::ok(OptionRow::from(option)),
        None => ApiResponse::failure(404, "Opción no encontrada"),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClickData {
    conversion_id: u64,
    url_afiliado: String,
}

/// `POST /api/tracking/click`; requires an authenticated user
pub fn handle_click(
    conversions: &dyn ConversionStore,
    repository: &dyn OptionRepository,
    user_id: Option<u64>,
    body: &str,
) -> ApiResponse {
    let Some(user_id) = user_id else {
        return ApiResponse::failure(401, "Token no proporcionado");
    };
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let option_id = match number_field(&body, "opcionId") {
        Ok(Some(id)) if id != 0.0 => id,
        Ok(_) => return ApiResponse::failure(400, "opcionId requerido"),
        Err(response) => return response,
    };
    if option_id < 0.0 || option_id.fract() != 0.0 || option_id > u32::MAX as f64 {
        return ApiResponse::failure(404, "Opción no encontrada");
    }
    let estimated_amount = match number_field(&body, "montoEstimado") {
        Ok(amount) => amount,
        Err(response) => return response,
    };

    match record_click(conversions, repository, user_id, option_id as u32, estimated_amount) {
        Ok(receipt) => {
            let data = ClickData {
                conversion_id: receipt.conversion_id,
                url_afiliado: receipt.affiliate_url,
            };
            ApiResponse {
                status: 200,
                body: json!({ "success": true, "message": "Click registrado", "data": data }),
            }
        }
        Err(ConversionError::OptionNotFound(_)) => ApiResponse::failure(404, "Opción no encontrada"),
        Err(ConversionError::Invalid(reason)) => {
            warn!("rejected click from user {}: {}", user_id, reason);
            ApiResponse::failure(400, &reason)
        }
        Err(err) => {
            error!("Error registrando click: {}", err);
            ApiResponse::failure(500, "Error al registrar click")
        }
    }
}

/// `GET /api/stats`
pub fn handle_stats(conversions: &dyn ConversionStore, repository: &dyn OptionRepository) -> ApiResponse {
    match conversions.count() {
        Ok(total_conversions) => ApiResponse::ok(json!({
            "totalOpciones": repository.list_active().len(),
            "totalConversiones": total_conversions,
        })),
        Err(err) => {
            error!("Error obteniendo stats: {}", err);
            ApiResponse::failure(500, "Error obteniendo stats")
        }
    }
}

/// `GET /api/health`
pub fn handle_health() -> ApiResponse {
    ApiResponse {
        status: 200,
        body: json!({
            "success": true,
            "message": "API funcionando correctamente",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        }),
    }
}

/// Everything a request needs, constructed once by the host and passed in
pub struct ApiContext {
    pub engine: ProjectionEngine,
    pub planner: GoalPlanner,
    pub catalog: Box<dyn OptionRepository + Send + Sync>,
    pub conversions: Box<dyn ConversionStore + Send + Sync>,
}

impl ApiContext {
    pub fn new(engine: ProjectionEngine, catalog: Box<dyn OptionRepository + Send + Sync>) -> Self {
        Self {
            planner: GoalPlanner::new(engine.clone()),
            engine,
            catalog,
            conversions: Box::new(InMemoryConversionStore::new()),
        }
    }

    /// Replace the default in-memory conversion store
    pub fn with_conversions(mut self, conversions: Box<dyn ConversionStore + Send + Sync>) -> Self {
        self.conversions = conversions;
        self
    }

    /// Dispatch a request by method and path.
    /// `user_id` is the caller identity established by the host, if any.
    pub fn route(&self, method: &str, path: &str, user_id: Option<u64>, body: Option<&str>) -> ApiResponse {
        let path = path.trim_end_matches('/');
        let body = body.unwrap_or("");

        match (method.to_ascii_uppercase().as_str(), path) {
            ("POST", "/api/calcular/proyeccion") => handle_projection(&self.engine, body),
            ("POST", "/api/calcular/plan") => handle_plan(&self.planner, self.catalog.as_ref(), body),
            ("GET", "/api/opciones") => handle_list_options(self.catalog.as_ref()),
            ("POST", "/api/tracking/click") => {
                handle_click(self.conversions.as_ref(), self.catalog.as_ref(), user_id, body)
            }
            ("GET", "/api/stats") => handle_stats(self.conversions.as_ref(), self.catalog.as_ref()),
            ("GET", "/api/health") => handle_health(),
            ("GET", p) if p.starts_with("/api/opciones/") => {
                handle_get_option(self.catalog.as_ref(), &p["/api/opciones/".len()..])
            }
            _ => ApiResponse::failure(404, "Ruta no encontrada"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;

    fn context() -> ApiContext {
        ApiContext::new(ProjectionEngine::default(), Box::new(InMemoryCatalog::with_defaults()))
    }

    #[test]
    fn test_projection_success() {
        let response = context().route(
            "POST",
            "/api/calcular/proyeccion",
            None,
            Some(r#"{"montoInicial": 10000, "tasaAnual": 12, "meses": 12}"#),
        );
        assert_eq!(response.status, 200);

        let data = &response.body["data"];
        assert_eq!(response.body["success"], true);
        assert_eq!(data["montoFinal"], 11268.25);
        assert_eq!(data["totalAportado"], 10000.0);
        assert_eq!(data["totalIntereses"], 1268.25);
        assert_eq!(data["rendimientoTotal"], 12.68);

        let months = data["proyeccionMensual"].as_array().unwrap();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0]["mes"], 1);
        assert_eq!(months[0]["saldo"], 10100.0);
        assert_eq!(months[0]["interesesMes"], 100.0);
        assert_eq!(months[0]["aporteMes"], 0.0);
    }

    #[test]
    fn test_projection_accepts_numeric_strings() {
        let response = handle_projection(
            &ProjectionEngine::default(),
            r#"{"montoInicial": "1000", "aportesMensuales": "100", "tasaAnual": "0", "meses": "10"}"#,
        );
        assert_eq!(response.status, 200);
        assert_eq!(response.body["data"]["montoFinal"], 2000.0);
    }

    #[test]
    fn test_projection_missing_fields() {
        let engine = ProjectionEngine::default();
        for body in [
            r#"{"tasaAnual": 12, "meses": 12}"#,
            r#"{"montoInicial": 100, "meses": 12}"#,
            r#"{"montoInicial": 100, "tasaAnual": 12, "meses": null}"#,
        ] {
            let response = handle_projection(&engine, body);
            assert_eq!(response.status, 400, "{}", body);
            assert_eq!(response.body["success"], false);
            assert_eq!(response.body["message"], MISSING_PARAMS);
        }
    }

    #[test]
    fn test_projection_invalid_values() {
        let engine = ProjectionEngine::default();
        for body in [
            "not json",
            "[1, 2]",
            r#"{"montoInicial": -1, "tasaAnual": 5, "meses": 10}"#,
            r#"{"montoInicial": 100, "tasaAnual": 5, "meses": 0}"#,
            r#"{"montoInicial": 100, "tasaAnual": 5, "meses": 2.5}"#,
            r#"{"montoInicial": 100, "tasaAnual": 5, "meses": 5000}"#,
            r#"{"montoInicial": "cien", "tasaAnual": 5, "meses": 10}"#,
            r#"{"montoInicial": 100, "tasaAnual": true, "meses": 10}"#,
        ] {
            let response = handle_projection(&engine, body);
            assert_eq!(response.status, 400, "{}", body);
            assert_eq!(response.body["success"], false);
        }
    }

    #[test]
    fn test_projection_too_large_to_report_is_client_error() {
        let response = handle_projection(
            &ProjectionEngine::default(),
            r#"{"montoInicial": 1e307, "tasaAnual": 0, "meses": 1}"#,
        );
        assert_eq!(response.status, 400);
        assert_eq!(response.body["success"], false);
        assert!(response.body.get("data").is_none());
    }

    #[test]
    fn test_plan_medium_tolerance() {
        let response = context().route(
            "POST",
            "/api/calcular/plan",
            None,
            Some(r#"{"montoActual": 10000, "montoMeta": 50000, "mesesPlazo": 24, "toleranciaRiesgo": "medio"}"#),
        );
        assert_eq!(response.status, 200);

        let data = &response.body["data"];
        assert_eq!(data["mesesPlazo"], 24);
        let plans = data["planes"].as_array().unwrap();
        let ids: Vec<u64> = plans.iter().map(|p| p["opcionId"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![4, 2, 5]);

        let kuspit = &plans[0];
        assert_eq!(kuspit["nombre"], "Kuspit Diversificado");
        assert_eq!(kuspit["nivelRiesgo"], "medio");
        assert_eq!(kuspit["alcanzaMeta"], true);
        assert!(kuspit["excedente"].as_f64().unwrap() >= 0.0);
        let contribution = kuspit["aportesMensuales"].as_f64().unwrap();
        assert_eq!(contribution, contribution.ceil());
    }

    #[test]
    fn test_plan_goal_already_met() {
        let response = handle_plan(
            &GoalPlanner::default(),
            &InMemoryCatalog::with_defaults(),
            r#"{"montoActual": 5000, "montoMeta": 5000, "mesesPlazo": 12}"#,
        );
        assert_eq!(response.status, 200);
        let plans = response.body["data"]["planes"].as_array().unwrap();
        assert_eq!(plans.len(), 3);
        for plan in plans {
            assert_eq!(plan["aportesMensuales"], 0.0);
            assert_eq!(plan["alcanzaMeta"], true);
        }
    }

    #[test]
    fn test_plan_rejects_bad_goal() {
        let planner = GoalPlanner::default();
        let catalog = InMemoryCatalog::with_defaults();

        let missing = handle_plan(&planner, &catalog, r#"{"montoActual": 100, "mesesPlazo": 12}"#);
        assert_eq!(missing.status, 400);
        assert_eq!(missing.body["message"], MISSING_PARAMS);

        let zero_target = handle_plan(&planner, &catalog, r#"{"montoActual": 100, "montoMeta": 0, "mesesPlazo": 12}"#);
        assert_eq!(zero_target.status, 400);
    }

    #[test]
    fn test_options_endpoints() {
        let ctx = context();

        let list = ctx.route("GET", "/api/opciones", None, None);
        assert_eq!(list.status, 200);
        assert_eq!(list.body["count"], 5);
        assert_eq!(list.body["data"][0]["nombre"], "Kuspit Diversificado");
        assert_eq!(list.body["data"][0]["liquidez"], "media");

        let one = ctx.route("GET", "/api/opciones/1", None, None);
        assert_eq!(one.status, 200);
        assert_eq!(one.body["data"]["nivel_riesgo"], "muy_bajo");

        assert_eq!(ctx.route("GET", "/api/opciones/99", None, None).status, 404);
        assert_eq!(ctx.route("GET", "/api/opciones/abc", None, None).status, 404);
    }

    #[test]
    fn test_options_carry_affiliate_fields() {
        let one = context().route("GET", "/api/opciones/3", None, None);
        assert_eq!(one.body["data"]["url_afiliado"], "https://gbm.com/registro?ref=");
        assert_eq!(one.body["data"]["comision_referido"], 200.0);
    }

    #[test]
    fn test_click_tracking_and_stats() {
        let ctx = context();

        let click = ctx.route(
            "POST",
            "/api/tracking/click",
            Some(12),
            Some(r#"{"opcionId": 4, "montoEstimado": "2500"}"#),
        );
        assert_eq!(click.status, 200);
        assert_eq!(click.body["message"], "Click registrado");
        assert_eq!(click.body["data"]["conversionId"], 1);
        assert_eq!(click.body["data"]["urlAfiliado"], "https://kuspit.com/registro?ref=kuspit_12_1");

        let stored = ctx.conversions.list_for_user(12).unwrap();
        assert_eq!(stored[0].estimated_amount, Some(2_500.0));

        let stats = ctx.route("GET", "/api/stats", None, None);
        assert_eq!(stats.status, 200);
        assert_eq!(stats.body["data"]["totalOpciones"], 5);
        assert_eq!(stats.body["data"]["totalConversiones"], 1);
    }

    #[test]
    fn test_click_rejections() {
        let ctx = context();
        let click = |user: Option<u64>, body: &str| ctx.route("POST", "/api/tracking/click", user, Some(body));

        assert_eq!(click(None, r#"{"opcionId": 1}"#).status, 401);

        let missing = click(Some(1), r#"{"montoEstimado": 100}"#);
        assert_eq!(missing.status, 400);
        assert_eq!(missing.body["message"], "opcionId requerido");
        assert_eq!(click(Some(1), r#"{"opcionId": 0}"#).status, 400);

        let unknown = click(Some(1), r#"{"opcionId": 99}"#);
        assert_eq!(unknown.status, 404);
        assert_eq!(unknown.body["message"], "Opción no encontrada");
        assert_eq!(click(Some(1), r#"{"opcionId": 1.5}"#).status, 404);

        assert_eq!(click(Some(1), r#"{"opcionId": 1, "montoEstimado": -5}"#).status, 400);
        assert_eq!(ctx.conversions.count().unwrap(), 0);
    }

    #[test]
    fn test_health_and_unknown_route() {
        let ctx = context();
        let health = ctx.route("get", "/api/health/", None, None);
        assert!(health.is_success());
        assert_eq!(health.body["version"], env!("CARGO_PKG_VERSION"));

        assert_eq!(ctx.route("DELETE", "/api/calcular/proyeccion", None, None).status, 404);
    }
}
