//! Fee-aware message service router.
//!
//! Routes are bound once at startup from [`ServiceDesc`]s and never change
//! afterwards. Each dispatched message goes through, in order: fee
//! consumption, the circuit breaker, `validate_basic`, then its handler.

use super::context::{wrap_service_result, MsgContext, MsgResult, TxContext};
use super::service::{HybridHandler, MethodDesc, MethodHandler, ServiceDesc};
use crate::domain::{msg_name, sorted_entries, Msg, MsgFeesError, MsgResponse, RegistrationError};
use crate::keeper::{ensure_sufficient_fees, MsgFeesKeeper};
use crate::ports::{CircuitBreaker, FeeMeter, InterfaceRegistry};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct Route {
    method: String,
    response_type_url: String,
    handler: MethodHandler,
}

/// Dispatches messages to their registered handlers, charging additional
/// message fees on the way.
pub struct MsgServiceRouter {
    registry: Arc<dyn InterfaceRegistry>,
    keeper: MsgFeesKeeper,
    circuit_breaker: Option<Arc<dyn CircuitBreaker>>,
    routes: HashMap<String, Route>,
    hybrid_handlers: HashMap<String, HybridHandler>,
}

impl MsgServiceRouter {
    pub fn new(registry: Arc<dyn InterfaceRegistry>, keeper: MsgFeesKeeper) -> Self {
        Self {
            registry,
            keeper,
            circuit_breaker: None,
            routes: HashMap::new(),
            hybrid_handlers: HashMap::new(),
        }
    }

    /// Installs the circuit breaker.
    ///
    /// Hybrid handlers capture the breaker when they are registered, so this
    /// must be called before [`Self::register_service`].
    pub fn set_circuit_breaker(&mut self, circuit_breaker: Arc<dyn CircuitBreaker>) {
        self.circuit_breaker = Some(circuit_breaker);
    }

    pub fn keeper(&self) -> &MsgFeesKeeper {
        &self.keeper
    }

    /// Registers every method of `service`.
    ///
    /// All methods are checked before any is inserted, so a failed
    /// registration leaves the router unchanged.
    pub fn try_register_service(&mut self, service: &ServiceDesc) -> Result<(), RegistrationError> {
        let mut seen = HashSet::new();
        for method in &service.methods {
            if self.registry.resolve(&method.request_type_url).is_none() {
                return Err(RegistrationError::UnregisteredType {
                    service: service.service_name.clone(),
                    type_url: method.request_type_url.clone(),
                });
            }
            if self.routes.contains_key(&method.request_type_url)
                || !seen.insert(method.request_type_url.as_str())
            {
                return Err(RegistrationError::DuplicateRoute {
                    method: service.full_method_name(method),
                    type_url: method.request_type_url.clone(),
                });
            }
        }

        for method in &service.methods {
            let hybrid = self.hybrid_handler(method);
            self.hybrid_handlers
                .insert(msg_name(&method.request_type_url).to_string(), hybrid);
            self.routes.insert(
                method.request_type_url.clone(),
                Route {
                    method: service.full_method_name(method),
                    response_type_url: method.response_type_url.clone(),
                    handler: Arc::clone(&method.handler),
                },
            );
            debug!(
                "[qc-18] registered {} for {}",
                service.full_method_name(method),
                method.request_type_url
            );
        }

        info!(
            "[qc-18] registered service {} ({} methods)",
            service.service_name,
            service.methods.len()
        );
        Ok(())
    }

    /// Registers every method of `service`.
    ///
    /// # Panics
    ///
    /// If a request type was never declared in the interface registry or is
    /// already routed. Both are wiring mistakes the node cannot start with.
    pub fn register_service(&mut self, service: &ServiceDesc) {
        if let Err(e) = self.try_register_service(service) {
            panic!("unable to register service {}: {}", service.service_name, e);
        }
    }

    pub fn has_route(&self, msg_type_url: &str) -> bool {
        self.routes.contains_key(msg_type_url)
    }

    /// Handler for a message name (type URL without the leading `/`).
    pub fn hybrid_handler_by_msg_name(&self, msg_name: &str) -> Option<HybridHandler> {
        self.hybrid_handlers.get(msg_name).cloned()
    }

    /// Dispatches one message of the transaction in `tx`.
    pub fn dispatch(&self, tx: &mut TxContext<'_>, msg: &dyn Msg) -> Result<MsgResult, MsgFeesError> {
        let msg_type_url = msg.type_url();
        let route = self.routes.get(msg_type_url).ok_or_else(|| {
            warn!("[qc-18] no route for {}", msg_type_url);
            MsgFeesError::UnknownMessageType(msg_type_url.to_string())
        })?;

        self.consume_msg_fees(tx, msg)?;
        ensure_allowed(self.circuit_breaker.as_deref(), msg_type_url)?;
        msg.validate_basic()?;

        let mut ctx = MsgContext::new(msg_type_url, tx.gas_limit());
        let response = (route.handler)(&mut ctx, msg)?;
        if response.type_url() != route.response_type_url {
            warn!(
                "[qc-18] {} returned {}, expected {}",
                route.method,
                response.type_url(),
                route.response_type_url
            );
            return Err(MsgFeesError::InvalidResponseType {
                expected: route.response_type_url.clone(),
                got: response.type_url().to_string(),
            });
        }

        Ok(wrap_service_result(ctx, &*response))
    }

    /// Dispatches `msgs` in order, halting on the first failure.
    pub fn dispatch_all(
        &self,
        tx: &mut TxContext<'_>,
        msgs: &[&dyn Msg],
    ) -> Result<Vec<MsgResult>, MsgFeesError> {
        msgs.iter().map(|msg| self.dispatch(tx, *msg)).collect()
    }

    fn consume_msg_fees(&self, tx: &mut TxContext<'_>, msg: &dyn Msg) -> Result<(), MsgFeesError> {
        let declared_fee = tx.declared_fee().clone();
        let gas_limit = tx.gas_limit();
        let msg_type_url = msg.type_url();

        // Passed governance proposals are replayed without a fee meter and
        // run free of message fees.
        let Some(meter) = tx.fee_meter() else {
            debug!("[qc-18] no fee meter, skipping msg fees for {}", msg_type_url);
            return Ok(());
        };

        let distribution = self.keeper.calculate_additional_fees_to_be_paid(&[msg])?;
        if distribution.total_additional_fees.is_zero() {
            return Ok(());
        }

        if !meter.is_simulate() {
            let mut msg_fees = meter.fee_consumed();
            msg_fees.add(&distribution.total_additional_fees)?;
            let floor_gas_price = self.keeper.floor_gas_price()?;
            ensure_sufficient_fees(&declared_fee, &floor_gas_price, gas_limit, &msg_fees)?;
        }

        if !distribution.additional_module_fees.is_zero() {
            meter.consume_fee(&distribution.additional_module_fees, msg_type_url, "")?;
        }
        for (recipient, coins) in sorted_entries(&distribution.recipient_distributions) {
            meter.consume_fee(coins, msg_type_url, recipient)?;
        }

        Ok(())
    }

    fn hybrid_handler(&self, method: &MethodDesc) -> HybridHandler {
        let inner = Arc::clone(&method.handler);
        let Some(breaker) = self.circuit_breaker.clone() else {
            return inner;
        };

        let msg_type_url = method.request_type_url.clone();
        Arc::new(move |ctx: &mut MsgContext, msg: &dyn Msg| -> Result<Box<dyn MsgResponse>, MsgFeesError> {
            ensure_allowed(Some(&*breaker), &msg_type_url)?;
            inner(ctx, msg)
        })
    }
}

fn ensure_allowed(
    circuit_breaker: Option<&dyn CircuitBreaker>,
    msg_type_url: &str,
) -> Result<(), MsgFeesError> {
    let Some(breaker) = circuit_breaker else {
        return Ok(());
    };
    if !breaker.is_allowed(msg_type_url)? {
        warn!("[qc-18] circuit breaker disallows {}", msg_type_url);
        return Err(MsgFeesError::CircuitBreakerDisallowed(msg_type_url.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        FeeGasMeter, InMemoryInterfaceRegistry, InMemoryKvStore, MsgTypeCircuitBreaker,
    };
    use crate::application::MsgFeesService;
    use crate::config::MsgFeesConfig;
    use crate::domain::{
        Coin, Coins, Event, MsgAssessCustomMsgFee, MsgFee, Params, TypedMsg, TypedResponse,
    };
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PING: &str = "/qc.test.v1.MsgPing";
    const SERVICE: &str = "qc.test.v1.Msg";

    #[derive(Debug)]
    struct MsgPing {
        valid: bool,
    }

    impl Msg for MsgPing {
        fn type_url(&self) -> &str {
            PING
        }

        fn validate_basic(&self) -> Result<(), MsgFeesError> {
            if self.valid {
                Ok(())
            } else {
                Err(MsgFeesError::InvalidRequest("ping is invalid".into()))
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl TypedMsg for MsgPing {
        const TYPE_URL: &'static str = PING;
    }

    #[derive(Debug)]
    struct MsgPingResponse;

    impl MsgResponse for MsgPingResponse {
        fn type_url(&self) -> &str {
            "/qc.test.v1.MsgPingResponse"
        }

        fn encode(&self) -> Vec<u8> {
            b"pong".to_vec()
        }
    }

    impl TypedResponse for MsgPingResponse {
        const TYPE_URL: &'static str = "/qc.test.v1.MsgPingResponse";
    }

    fn ping() -> MsgPing {
        MsgPing { valid: true }
    }

    fn addr(byte: u8) -> String {
        format!("0x{}", hex::encode([byte; 20]))
    }

    fn nqc(amount: u128) -> Coins {
        Coins::from(Coin::new("nqc", amount))
    }

    fn ping_service(calls: Arc<AtomicUsize>) -> ServiceDesc {
        ServiceDesc::new(SERVICE).with_method(MethodDesc::typed(
            "Ping",
            move |ctx: &mut MsgContext, _msg: &MsgPing| {
                calls.fetch_add(1, Ordering::SeqCst);
                ctx.emit(Event::new("ping"));
                Ok(MsgPingResponse)
            },
        ))
    }

    struct Harness {
        router: MsgServiceRouter,
        calls: Arc<AtomicUsize>,
    }

    fn harness_with(breaker: Option<Arc<dyn CircuitBreaker>>) -> Harness {
        let registry = InMemoryInterfaceRegistry::new();
        registry.register(PING);
        let keeper = MsgFeesKeeper::new(Arc::new(InMemoryKvStore::new()), MsgFeesConfig::default());
        keeper
            .set_params(&Params {
                floor_gas_price: Coin::new("nqc", 1),
                ..Params::default()
            })
            .unwrap();

        let mut router = MsgServiceRouter::new(Arc::new(registry), keeper);
        if let Some(breaker) = breaker {
            router.set_circuit_breaker(breaker);
        }
        let calls = Arc::new(AtomicUsize::new(0));
        router.register_service(&ping_service(Arc::clone(&calls)));
        Harness { router, calls }
    }

    fn harness() -> Harness {
        harness_with(None)
    }

    fn with_ping_fee(h: &Harness, amount: u128, recipient: &str, bips: u32) {
        h.router
            .keeper()
            .set_msg_fee(&MsgFee::new(PING, Coin::new("nqc", amount), recipient, bips))
            .unwrap();
    }

    #[test]
    fn test_register_unregistered_type_fails() {
        let registry = InMemoryInterfaceRegistry::new();
        let keeper = MsgFeesKeeper::new(Arc::new(InMemoryKvStore::new()), MsgFeesConfig::default());
        let mut router = MsgServiceRouter::new(Arc::new(registry), keeper);

        let err = router
            .try_register_service(&ping_service(Arc::new(AtomicUsize::new(0))))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::UnregisteredType { .. }));
        assert!(!router.has_route(PING));
    }

    #[test]
    #[should_panic(expected = "has not been registered")]
    fn test_register_service_panics_on_unregistered_type() {
        let keeper = MsgFeesKeeper::new(Arc::new(InMemoryKvStore::new()), MsgFeesConfig::default());
        let mut router = MsgServiceRouter::new(Arc::new(InMemoryInterfaceRegistry::new()), keeper);
        router.register_service(&ping_service(Arc::new(AtomicUsize::new(0))));
    }

    #[test]
    #[should_panic(expected = "already been registered")]
    fn test_register_service_twice_panics() {
        let mut h = harness();
        let calls = Arc::clone(&h.calls);
        h.router.register_service(&ping_service(calls));
    }

    #[test]
    fn test_duplicate_within_one_service_registers_nothing() {
        let registry = InMemoryInterfaceRegistry::new();
        registry.register(PING);
        let keeper = MsgFeesKeeper::new(Arc::new(InMemoryKvStore::new()), MsgFeesConfig::default());
        let mut router = MsgServiceRouter::new(Arc::new(registry), keeper);

        let calls = Arc::new(AtomicUsize::new(0));
        let mut service = ping_service(calls);
        let again = service.methods[0].clone();
        service.methods.push(again);

        assert!(matches!(
            router.try_register_service(&service),
            Err(RegistrationError::DuplicateRoute { .. })
        ));
        assert!(!router.has_route(PING));
        assert!(router.hybrid_handler_by_msg_name("qc.test.v1.MsgPing").is_none());
    }

    #[test]
    fn test_unknown_message_type() {
        let h = harness();
        let mut tx = TxContext::new(Coins::new(), 100);

        let msg = crate::domain::MsgRemoveMsgFee {
            authority: addr(1),
            msg_type_url: PING.into(),
        };
        assert_eq!(
            h.router.dispatch(&mut tx, &msg).unwrap_err(),
            MsgFeesError::UnknownMessageType(crate::domain::MsgRemoveMsgFee::TYPE_URL.into())
        );
    }

    #[test]
    fn test_no_rule_executes_without_consuming_fees() {
        let h = harness();
        let mut meter = FeeGasMeter::new();
        let mut tx = TxContext::new(Coins::new(), 100).with_fee_meter(&mut meter);

        let result = h.router.dispatch(&mut tx, &ping()).unwrap();

        assert_eq!(result.data, b"pong".to_vec());
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
        assert!(meter.fee_consumed().is_zero());
    }

    #[test]
    fn test_missing_fee_meter_bypasses_fee_enforcement_trust_boundary() {
        // Governance replays passed proposals without a fee meter. Such
        // messages run free of message fees no matter what the schedule says.
        let h = harness();
        with_ping_fee(&h, 1_000_000, "", 0);
        let mut tx = TxContext::new(Coins::new(), 100);

        assert!(h.router.dispatch(&mut tx, &ping()).is_ok());
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_insufficient_fee_stops_before_handler() {
        let h = harness();
        with_ping_fee(&h, 100, "", 0);
        let mut meter = FeeGasMeter::new();
        // floor 1 × 100 gas + 100 msg fee = 200
        let mut tx = TxContext::new(nqc(199), 100).with_fee_meter(&mut meter);

        assert_eq!(
            h.router.dispatch(&mut tx, &ping()).unwrap_err(),
            MsgFeesError::InsufficientFee {
                got: "199nqc".into(),
                required: "200nqc".into(),
            }
        );
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
        assert!(meter.fee_consumed().is_zero());
    }

    #[test]
    fn test_fees_consumed_per_recipient() {
        let h = harness();
        let r1 = addr(0x51);
        with_ping_fee(&h, 100, &r1, 2_500);
        let mut meter = FeeGasMeter::new();
        let mut tx = TxContext::new(nqc(200), 100).with_fee_meter(&mut meter);

        h.router.dispatch(&mut tx, &ping()).unwrap();

        assert_eq!(meter.fee_consumed(), nqc(100));
        let dist = meter.fee_consumed_distributions();
        assert_eq!(dist[""], nqc(75));
        assert_eq!(dist[&r1], nqc(25));
    }

    /// Records every consumption as `(recipient, amount)` in call order.
    #[derive(Default)]
    struct RecordingMeter {
        consumed: Coins,
        calls: Vec<(String, Coins)>,
    }

    impl FeeMeter for RecordingMeter {
        fn is_simulate(&self) -> bool {
            false
        }

        fn fee_consumed(&self) -> Coins {
            self.consumed.clone()
        }

        fn consume_fee(
            &mut self,
            amount: &Coins,
            _msg_type_url: &str,
            recipient: &str,
        ) -> Result<(), MsgFeesError> {
            self.consumed.add(amount)?;
            self.calls.push((recipient.to_string(), amount.clone()));
            Ok(())
        }
    }

    #[test]
    fn test_fees_consumed_module_first_then_recipients_in_order() {
        let registry = InMemoryInterfaceRegistry::new();
        registry.register_module_msgs();
        let keeper = MsgFeesKeeper::new(Arc::new(InMemoryKvStore::new()), MsgFeesConfig::default());
        keeper
            .set_params(&Params {
                floor_gas_price: Coin::new("nqc", 1),
                ..Params::default()
            })
            .unwrap();
        let (r1, r2) = (addr(0x01), addr(0x02));
        // scheduled rule pays r2, the assessed fee pays r1
        keeper
            .set_msg_fee(&MsgFee::new(
                MsgAssessCustomMsgFee::TYPE_URL,
                Coin::new("nqc", 100),
                &r2,
                2_500,
            ))
            .unwrap();
        let service = Arc::new(MsgFeesService::new(keeper.clone()));
        let mut router = MsgServiceRouter::new(Arc::new(registry), keeper);
        router.register_service(&service.service_desc());

        let assess = MsgAssessCustomMsgFee {
            name: "kyc".into(),
            amount: Coin::new("nqc", 40),
            recipient: r1.clone(),
            from: addr(0x03),
            recipient_basis_points: String::new(),
        };
        let mut meter = RecordingMeter::default();
        let mut tx = TxContext::new(nqc(1_000), 100).with_fee_meter(&mut meter);

        router.dispatch(&mut tx, &assess).unwrap();

        assert_eq!(
            meter.calls,
            vec![
                (String::new(), nqc(95)),
                (r1, nqc(20)),
                (r2, nqc(25)),
            ]
        );
    }

    #[test]
    fn test_simulation_skips_sufficiency_check() {
        let h = harness();
        with_ping_fee(&h, 100, "", 0);
        let mut meter = FeeGasMeter::simulated();
        let mut tx = TxContext::new(Coins::new(), 100).with_fee_meter(&mut meter);

        h.router.dispatch(&mut tx, &ping()).unwrap();

        assert_eq!(meter.fee_consumed(), nqc(100));
    }

    #[test]
    fn test_meter_overflow_halts_dispatch() {
        let h = harness();
        with_ping_fee(&h, u128::MAX, "", 0);
        let mut meter = FeeGasMeter::simulated();
        let mut tx = TxContext::new(Coins::new(), 100).with_fee_meter(&mut meter);

        let (first, second) = (ping(), ping());
        let msgs: [&dyn Msg; 2] = [&first, &second];
        let err = h.router.dispatch_all(&mut tx, &msgs).unwrap_err();

        assert!(matches!(err, MsgFeesError::InvalidAmount(_)));
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
        assert_eq!(meter.fee_consumed(), nqc(u128::MAX));
        assert_eq!(meter.fee_consumed_distributions()[""], nqc(u128::MAX));
    }

    #[test]
    fn test_sufficiency_includes_fees_already_consumed() {
        let h = harness();
        with_ping_fee(&h, 100, "", 0);
        let mut meter = FeeGasMeter::new();
        // covers floor 100 plus one message fee only
        let mut tx = TxContext::new(nqc(200), 100).with_fee_meter(&mut meter);

        let (first, second) = (ping(), ping());
        let msgs: [&dyn Msg; 2] = [&first, &second];
        let err = h.router.dispatch_all(&mut tx, &msgs).unwrap_err();

        assert!(matches!(err, MsgFeesError::InsufficientFee { .. }));
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_circuit_breaker_disallows() {
        let breaker = Arc::new(MsgTypeCircuitBreaker::new());
        breaker.disable(PING);
        let h = harness_with(Some(breaker as Arc<dyn CircuitBreaker>));
        let mut tx = TxContext::new(Coins::new(), 100);

        assert_eq!(
            h.router.dispatch(&mut tx, &ping()).unwrap_err(),
            MsgFeesError::CircuitBreakerDisallowed(PING.into())
        );
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_validation_failure_propagates() {
        let h = harness();
        let mut tx = TxContext::new(Coins::new(), 100);

        assert_eq!(
            h.router.dispatch(&mut tx, &MsgPing { valid: false }).unwrap_err(),
            MsgFeesError::InvalidRequest("ping is invalid".into())
        );
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_response_of_wrong_type_is_rejected() {
        let registry = InMemoryInterfaceRegistry::new();
        registry.register(PING);
        let keeper = MsgFeesKeeper::new(Arc::new(InMemoryKvStore::new()), MsgFeesConfig::default());
        let mut router = MsgServiceRouter::new(Arc::new(registry), keeper);

        let handler: MethodHandler = Arc::new(|_ctx: &mut MsgContext, _msg: &dyn Msg| {
            Ok(Box::new(MsgPingResponse) as Box<dyn MsgResponse>)
        });
        router.register_service(&ServiceDesc::new(SERVICE).with_method(MethodDesc {
            method_name: "Ping".into(),
            request_type_url: PING.into(),
            response_type_url: "/qc.test.v1.MsgOtherResponse".into(),
            handler,
        }));

        let mut tx = TxContext::new(Coins::new(), 100);
        assert!(matches!(
            router.dispatch(&mut tx, &ping()),
            Err(MsgFeesError::InvalidResponseType { .. })
        ));
    }

    #[test]
    fn test_result_carries_handler_and_message_events() {
        let h = harness();
        let mut tx = TxContext::new(Coins::new(), 100);

        let result = h.router.dispatch(&mut tx, &ping()).unwrap();

        assert_eq!(result.msg_response_type_url, MsgPingResponse::TYPE_URL);
        assert_eq!(result.events[0].kind, "ping");
        assert_eq!(result.events[1].attribute("action"), Some(PING));
    }

    #[test]
    fn test_dispatch_all_halts_on_first_failure() {
        let h = harness();
        let mut tx = TxContext::new(Coins::new(), 100);
        let (first, bad, third) = (ping(), MsgPing { valid: false }, ping());
        let msgs: [&dyn Msg; 3] = [&first, &bad, &third];

        assert!(h.router.dispatch_all(&mut tx, &msgs).is_err());
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hybrid_handler_by_msg_name() {
        let h = harness();
        let handler = h.router.hybrid_handler_by_msg_name("qc.test.v1.MsgPing").unwrap();
        let mut ctx = MsgContext::new(PING, 0);

        // skips validation entirely
        assert!(handler(&mut ctx, &MsgPing { valid: false }).is_ok());
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
        assert!(h.router.hybrid_handler_by_msg_name(PING).is_none());
    }

    #[test]
    fn test_hybrid_handler_checks_circuit_breaker() {
        let breaker = Arc::new(MsgTypeCircuitBreaker::new());
        let h = harness_with(Some(breaker.clone() as Arc<dyn CircuitBreaker>));
        let handler = h.router.hybrid_handler_by_msg_name("qc.test.v1.MsgPing").unwrap();
        let mut ctx = MsgContext::new(PING, 0);

        breaker.disable(PING);
        assert_eq!(
            handler(&mut ctx, &ping()).unwrap_err(),
            MsgFeesError::CircuitBreakerDisallowed(PING.into())
        );
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }
}
