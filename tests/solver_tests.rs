//! End-to-end tests for the planner: validation, construction strategies,
//! asymmetric costs, stop conditions and the JSON surface.

mod fixtures;

use std::collections::BTreeMap;

use cvrp_planner::construction::ConstructionStrategy;
use cvrp_planner::haversine::{HaversineCost, HaversineProvider};
use cvrp_planner::local_search::{LocalSearch, MoveSet};
use cvrp_planner::repository::SolutionRepository;
use cvrp_planner::termination::StopSignal;
use cvrp_planner::{
    solve, solve_with_cancellation, CancellationToken, Customer, CustomerId, DistanceTable,
    Infeasibility, Location, Malformation, Problem, ProblemInstance, Solution, SolveError, SolveOptions,
    Solver, Termination, Vehicle, VehicleId,
};

use fixtures::{assert_valid, clustered_instance, route_ids, three_customer_instance, InstanceBuilder};

// ============================================================================
// Helpers
// ============================================================================

fn with_construction(construction: ConstructionStrategy) -> SolveOptions {
    SolveOptions {
        construction,
        ..SolveOptions::default()
    }
}

fn malformation(err: SolveError) -> Malformation {
    match err {
        SolveError::MalformedInstance(reason) => reason,
        other => panic!("expected a malformed instance, got {other:?}"),
    }
}

fn infeasibility(err: SolveError) -> Infeasibility {
    match err {
        SolveError::Infeasible(reason) => reason,
        other => panic!("expected an infeasible instance, got {other:?}"),
    }
}

/// Three unit-demand customers east of the depot where eastbound legs cost 10
/// extra. One eastbound leg is unavoidable, so the cheapest tour is 3, 2, 1.
fn uphill_line() -> ProblemInstance {
    InstanceBuilder::new()
        .customer(1, 1, 1, 0)
        .customer(2, 1, 2, 0)
        .customer(3, 1, 3, 0)
        .vehicle("V1", 10)
        .uphill(10)
        .build()
}

const STRATEGIES: [ConstructionStrategy; 3] = [
    ConstructionStrategy::CheapestInsertion,
    ConstructionStrategy::Savings,
    ConstructionStrategy::Portfolio,
];

// ============================================================================
// Instance validation
// ============================================================================

#[test]
fn test_duplicate_customer_is_malformed() {
    let mut instance = three_customer_instance();
    instance.customers.push(Customer::new(2, 1));

    let err = solve(&instance, SolveOptions::default()).unwrap_err();
    assert_eq!(malformation(err), Malformation::DuplicateCustomer(CustomerId(2)));
}

#[test]
fn test_duplicate_vehicle_is_malformed() {
    let mut instance = three_customer_instance();
    instance.vehicles.push(Vehicle::new("V1", 20));

    let err = solve(&instance, SolveOptions::default()).unwrap_err();
    assert_eq!(malformation(err), Malformation::DuplicateVehicle(VehicleId::new("V1")));
}

#[test]
fn test_negative_demand_is_malformed() {
    let instance = InstanceBuilder::new()
        .customer(1, -2, 1, 1)
        .vehicle("V1", 10)
        .build();

    let err = solve(&instance, SolveOptions::default()).unwrap_err();
    assert_eq!(
        malformation(err),
        Malformation::NegativeDemand {
            customer: CustomerId(1),
            demand: -2
        }
    );
}

#[test]
fn test_zero_capacity_vehicle_is_malformed() {
    let instance = InstanceBuilder::new()
        .customer(1, 2, 1, 1)
        .vehicle("V1", 10)
        .vehicle("spare", 0)
        .build();

    let err = solve(&instance, SolveOptions::default()).unwrap_err();
    assert_eq!(
        malformation(err),
        Malformation::NonPositiveCapacity {
            vehicle: VehicleId::new("spare"),
            capacity: 0
        }
    );
}

#[test]
fn test_missing_distance_is_malformed() {
    let a = Location::Customer(CustomerId(1));
    let b = Location::Customer(CustomerId(2));
    let mut distances = DistanceTable::new();
    distances.insert_symmetric(Location::Depot, a, 3.0);
    distances.insert_symmetric(Location::Depot, b, 4.0);
    distances.insert(a, b, 5.0);

    let instance = ProblemInstance {
        customers: vec![Customer::new(1, 1), Customer::new(2, 1)],
        vehicles: vec![Vehicle::new("V1", 10)],
        distances,
    };

    let err = solve(&instance, SolveOptions::default()).unwrap_err();
    assert_eq!(malformation(err), Malformation::MissingDistance { from: b, to: a });
}

#[test]
fn test_negative_distance_is_malformed() {
    let mut instance = three_customer_instance();
    instance
        .distances
        .insert(Location::Depot, Location::Customer(CustomerId(3)), -1.0);

    let err = solve(&instance, SolveOptions::default()).unwrap_err();
    assert!(matches!(
        malformation(err),
        Malformation::InvalidDistance { value, .. } if value == -1.0
    ));
}

#[test]
fn test_unparseable_instance_is_parse_error() {
    let err = ProblemInstance::from_json(r#"{"customers": [{"id": "one"}]}"#).unwrap_err();
    assert!(matches!(err, SolveError::Parse(_)));
    assert!(!err.is_malformed());
}

// ============================================================================
// Infeasibility
// ============================================================================

#[test]
fn test_fleet_too_small_overall() {
    let instance = InstanceBuilder::new()
        .customer(1, 6, 1, 0)
        .customer(2, 6, 2, 0)
        .vehicle("V1", 10)
        .build();

    let err = solve(&instance, SolveOptions::default()).unwrap_err();
    assert_eq!(
        infeasibility(err),
        Infeasibility::FleetCapacityExceeded {
            total_demand: 12,
            fleet_capacity: 10
        }
    );
}

#[test]
fn test_oversized_customer_reported_in_instance_order() {
    let instance = InstanceBuilder::new()
        .customer(9, 11, 1, 0)
        .customer(4, 12, 2, 0)
        .vehicle("V1", 10)
        .vehicle("V2", 30)
        .vehicle("V3", 5)
        .build();

    // Fits V2, so screening passes and both customers are served.
    let result = solve(&instance, SolveOptions::default()).expect("solve");
    assert_valid(&instance, &result);

    let mut too_big = instance.clone();
    too_big.vehicles.retain(|vehicle| vehicle.id != VehicleId::new("V2"));
    let err = solve(&too_big, SolveOptions::default()).unwrap_err();
    assert!(matches!(
        infeasibility(err),
        Infeasibility::DemandExceedsCapacity { customer: CustomerId(9), .. }
    ));
}

#[test]
fn test_bin_packing_failure_reports_stranded_customer() {
    // Total demand fits the fleet but no vehicle carries two customers.
    let instance = InstanceBuilder::new()
        .customer(1, 6, 1, 0)
        .customer(2, 6, 2, 0)
        .customer(3, 6, 3, 0)
        .vehicle("V1", 10)
        .vehicle("V2", 10)
        .build();

    for construction in STRATEGIES {
        let err = solve(&instance, with_construction(construction)).unwrap_err();
        assert_eq!(
            infeasibility(err),
            Infeasibility::Stranded {
                customer: CustomerId(3)
            },
            "{construction:?}"
        );
    }
}

#[test]
fn test_exact_fit_fleet_strands_greedy_builders() {
    // Shrinking V4 to 8 makes the fleet hold exactly the 42 units demanded.
    // A perfect packing exists, but neither heuristic searches for it.
    let mut instance = clustered_instance();
    instance.vehicles[3].capacity = 8;
    let problem = instance.to_problem().expect("problem");
    assert_eq!(problem.total_demand(), problem.fleet_capacity());

    for construction in [ConstructionStrategy::CheapestInsertion, ConstructionStrategy::Savings] {
        let err = solve(&instance, with_construction(construction)).unwrap_err();
        assert!(
            matches!(infeasibility(err), Infeasibility::Stranded { .. }),
            "{construction:?}"
        );
    }
}

#[test]
fn test_extreme_capacities_do_not_overflow() {
    let instance = InstanceBuilder::new()
        .customer(1, i64::MAX, 1, 0)
        .customer(2, i64::MAX, 0, 1)
        .customer(3, 0, 1, 1)
        .vehicle("V1", i64::MAX)
        .vehicle("V2", i64::MAX)
        .build();

    for construction in STRATEGIES {
        let result = solve(&instance, with_construction(construction)).expect("solve");
        assert_valid(&instance, &result);
        for vehicle in ["V1", "V2"] {
            let heavy = route_ids(&result, vehicle).iter().filter(|&&id| id != 3).count();
            assert_eq!(heavy, 1, "{construction:?}: {vehicle} carries one full load");
        }
    }

    let mut overloaded = instance.clone();
    overloaded.vehicles.pop();
    assert_eq!(
        infeasibility(solve(&overloaded, SolveOptions::default()).unwrap_err()),
        Infeasibility::FleetCapacityExceeded {
            total_demand: 2 * i128::from(i64::MAX),
            fleet_capacity: i128::from(i64::MAX),
        }
    );
}

// ============================================================================
// Construction strategies
// ============================================================================

#[test]
fn test_every_strategy_yields_valid_solution() {
    fixtures::init_tracing();
    let instance = clustered_instance();

    for construction in STRATEGIES {
        let result = solve(&instance, with_construction(construction)).expect("solve");
        assert_valid(&instance, &result);
        assert!(
            result.total_cost <= result.initial_cost,
            "{construction:?}: local search must not worsen the start"
        );
    }
}

#[test]
fn test_portfolio_starts_from_cheaper_heuristic() {
    let instance = clustered_instance();
    let insertion = solve(&instance, with_construction(ConstructionStrategy::CheapestInsertion))
        .expect("insertion");
    let savings = solve(&instance, with_construction(ConstructionStrategy::Savings)).expect("savings");
    let portfolio =
        solve(&instance, with_construction(ConstructionStrategy::Portfolio)).expect("portfolio");

    assert_eq!(
        portfolio.initial_cost,
        insertion.initial_cost.min(savings.initial_cost)
    );
}

#[test]
fn test_empty_instance_has_zero_cost() {
    let instance = InstanceBuilder::new().vehicle("V1", 10).build();

    let result = solve(&instance, SolveOptions::default()).expect("solve");

    assert_eq!(result.total_cost, 0.0);
    assert!(route_ids(&result, "V1").is_empty());
    assert_eq!(result.termination, Termination::Converged);
}

#[test]
fn test_zero_demand_customers_are_served() {
    let instance = InstanceBuilder::new()
        .customer(1, 0, 1, 0)
        .customer(2, 0, 0, 1)
        .vehicle("V1", 1)
        .build();

    let result = solve(&instance, SolveOptions::default()).expect("solve");
    assert_valid(&instance, &result);
}

// ============================================================================
// Asymmetric costs
// ============================================================================

#[test]
fn test_asymmetric_costs_pick_direction() {
    let instance = uphill_line();
    let ids = |raw: &[u64]| raw.iter().map(|&id| CustomerId(id)).collect::<Vec<_>>();
    assert_eq!(fixtures::route_cost(&instance, &ids(&[3, 2, 1])), 16.0);
    assert_eq!(fixtures::route_cost(&instance, &ids(&[1, 2, 3])), 36.0);

    for construction in STRATEGIES {
        let result = solve(&instance, with_construction(construction)).expect("solve");
        assert_valid(&instance, &result);
        assert_eq!(route_ids(&result, "V1"), vec![3, 2, 1], "{construction:?}");
        assert_eq!(result.total_cost, 16.0);
    }
}

#[test]
fn test_two_opt_alone_fixes_reversed_asymmetric_route() {
    let instance = uphill_line();
    let problem = instance.to_problem().expect("problem");
    let mut plan = BTreeMap::new();
    plan.insert(VehicleId::new("V1"), vec![CustomerId(1), CustomerId(2), CustomerId(3)]);
    let start = Solution::from_assignment(&problem, &plan).expect("assignment");
    assert_eq!(start.total_cost(), 36.0);

    let moves = MoveSet {
        two_opt: true,
        relocate: false,
        swap: false,
    };
    let repository = SolutionRepository::new();
    let report = LocalSearch::new(&problem)
        .with_moves(moves)
        .run(start, &repository, &StopSignal::never());

    // Reversing the whole route is the single best 2-opt move.
    assert_eq!(report.iterations, 1);
    assert_eq!(report.termination, Termination::Converged);
    assert_eq!(report.solution.total_cost(), 16.0);
    assert_eq!(repository.cost().expect("recorded"), 16.0);
}

// ============================================================================
// Stop conditions
// ============================================================================

#[test]
fn test_pre_cancelled_solve_returns_construction() {
    let instance = clustered_instance();
    let token = CancellationToken::new();
    token.cancel();

    let result = solve_with_cancellation(&instance, SolveOptions::default(), token).expect("solve");

    assert_valid(&instance, &result);
    assert_eq!(result.termination, Termination::Cancelled);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.total_cost, result.initial_cost);
}

#[test]
fn test_expired_time_limit_returns_construction() {
    let instance = clustered_instance();
    let options = SolveOptions {
        time_limit_ms: Some(0),
        ..SolveOptions::default()
    };

    let result = solve(&instance, options).expect("solve");

    assert_valid(&instance, &result);
    assert_eq!(result.termination, Termination::Cancelled);
    assert_eq!(result.total_cost, result.initial_cost);
}

#[test]
fn test_iteration_cap_reported_only_when_moves_remain() {
    let instance = clustered_instance();
    let unlimited = solve(&instance, SolveOptions::default()).expect("solve");
    assert_eq!(unlimited.termination, Termination::Converged);

    let capped = solve(
        &instance,
        SolveOptions {
            max_iterations: 0,
            ..SolveOptions::default()
        },
    )
    .expect("solve");

    let expected = if unlimited.iterations > 0 {
        Termination::CapReached
    } else {
        Termination::Converged
    };
    assert_eq!(capped.termination, expected);
    assert_eq!(capped.iterations, 0);
    assert_eq!(capped.total_cost, capped.initial_cost);
}

#[test]
fn test_cap_of_one_applies_single_move() {
    let instance = clustered_instance();
    let unlimited = solve(&instance, SolveOptions::default()).expect("solve");

    let capped = solve(
        &instance,
        SolveOptions {
            max_iterations: 1,
            ..SolveOptions::default()
        },
    )
    .expect("solve");

    assert!(capped.iterations <= 1);
    assert!(capped.total_cost >= unlimited.total_cost);
    if unlimited.iterations > 1 {
        assert_eq!(capped.termination, Termination::CapReached);
    }
}

#[test]
fn test_no_moves_means_construction_is_final() {
    let instance = clustered_instance();
    let options = SolveOptions {
        moves: MoveSet {
            two_opt: false,
            relocate: false,
            swap: false,
        },
        ..SolveOptions::default()
    };

    let result = solve(&instance, options).expect("solve");

    assert_eq!(result.termination, Termination::Converged);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.total_cost, result.initial_cost);
}

// ============================================================================
// Parallel execution
// ============================================================================

#[test]
fn test_parallel_matches_sequential() {
    let instance = clustered_instance();

    for construction in STRATEGIES {
        let sequential = solve(&instance, with_construction(construction)).expect("sequential");
        let parallel = solve(
            &instance,
            SolveOptions {
                parallel: true,
                ..with_construction(construction)
            },
        )
        .expect("parallel");

        assert_eq!(sequential, parallel, "{construction:?}");
    }
}

// ============================================================================
// JSON surface and providers
// ============================================================================

#[test]
fn test_json_document_end_to_end() {
    let json = r#"{
        "customers": [{"id": 1, "demand": 5}, {"id": 2, "demand": 3}],
        "vehicles": [{"id": "V1", "capacity": 10}],
        "distances": {
            "depot": {"1": 4, "2": 6},
            "1": {"depot": 4, "2": 3},
            "2": {"depot": 6, "1": 3}
        }
    }"#;
    let instance = ProblemInstance::from_json(json).expect("parse");

    let result = solve(&instance, SolveOptions::default()).expect("solve");
    assert_eq!(result.total_cost, 13.0);

    let value: serde_json::Value = serde_json::from_str(&result.to_json().expect("to_json")).expect("json");
    assert_eq!(value["total_cost"], serde_json::json!(13.0));
    assert_eq!(value["feasible"], serde_json::json!(true));
    assert_eq!(value["termination"], serde_json::json!("converged"));
    assert_eq!(value["routes"]["V1"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_options_from_json_fill_defaults() {
    let options = SolveOptions::from_json(
        r#"{"max_iterations": 5, "construction": "savings", "moves": {"swap": false}}"#,
    )
    .expect("options");

    assert_eq!(options.max_iterations, 5);
    assert_eq!(options.construction, ConstructionStrategy::Savings);
    assert!(options.moves.two_opt && options.moves.relocate && !options.moves.swap);
    assert_eq!(options.time_limit(), None);
    assert!(!options.parallel);

    assert_eq!(SolveOptions::from_json("{}").expect("empty"), SolveOptions::default());
    assert!(SolveOptions::from_json(r#"{"construction": "random"}"#).is_err());
}

#[test]
fn test_haversine_provider_drives_solver() {
    let north = Location::Customer(CustomerId(1));
    let south = Location::Customer(CustomerId(2));
    let provider = HaversineProvider::new((36.17, -115.14), HaversineCost::Kilometers)
        .with_location(north, (36.30, -115.14))
        .with_location(south, (36.05, -115.14));

    let problem = Problem::new(
        vec![Customer::new(1, 4), Customer::new(2, 4)],
        vec![Vehicle::new("A", 5), Vehicle::new("B", 5)],
        &provider,
    )
    .expect("problem");

    let outcome = Solver::new(&problem, SolveOptions::default()).run().expect("solve");

    assert!(outcome.solution.is_feasible());
    assert!(outcome.solution.routes().iter().all(|route| route.len() == 1));
    assert!(outcome.solution.total_cost() > 0.0);
}
