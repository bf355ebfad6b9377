use crate::models::{
    Admission, AdmissionParams, Examination, ExaminationParams, LabDay, ModelError, OfficeAction,
};
use crate::sim::{EventSchedule, SimTime, SimUnit, UnitCtx};

fn clockwork_admission() -> AdmissionParams {
    AdmissionParams {
        opening: SimTime::from_hours(1.0),
        service_mean: 300.0,
        service_std: 0.0,
        arrival_min: 600.0,
        arrival_max: 600.0,
        delay_to_exam: SimTime::from_mins(1.0),
    }
}

fn clockwork_exam(nurses: u32) -> ExaminationParams {
    ExaminationParams {
        nurses,
        exam_mean: 420.0,
        exam_std: 0.0,
    }
}

/// 检查室先注册（admission 需要它的标识），然后把两者跑完一天
fn run_lab(
    admission: AdmissionParams,
    exam: ExaminationParams,
    seed: Option<u64>,
) -> (Admission, Examination, SimTime) {
    let mut s = EventSchedule::default();
    let exam_id = s.bind_unit(0);
    let adm_id = s.bind_unit(0);
    let mut exam = Examination::new(exam, seed).expect("examination");
    let mut adm = Admission::new(admission, exam_id, seed).expect("admission");

    exam.init(&mut UnitCtx::new(exam_id, &mut s), SimTime::ZERO, SimTime::ZERO);
    adm.init(&mut UnitCtx::new(adm_id, &mut s), SimTime::ZERO, SimTime::ZERO);

    while let Some(ev) = s.get_event() {
        let (_, unit, action) = ev.into_parts();
        let mut ctx = UnitCtx::new(unit, &mut s);
        if unit == exam_id {
            exam.play(&mut ctx, action);
        } else {
            adm.play(&mut ctx, action);
        }
    }
    let last = s.now();
    (adm, exam, last)
}

#[test]
fn admitted_users_move_on_to_examination() {
    let (adm, exam, last) = run_lab(clockwork_admission(), clockwork_exam(1), None);

    // 到达 600..3600 共 6 位；最后一位关门后登记，3900 登记完，3960 开始检查
    assert_eq!(last, SimTime(4380.0));
    let day = LabDay::collect(&adm, &exam, last);
    assert_eq!(day.admitted, 6);
    assert_eq!(day.admitted_after_closing, 1);
    assert_eq!(day.examined, 6);
    assert_eq!(day.overtime, 780.0);
    assert_eq!(day.nurse_busy_share.len(), 2);
    assert!((day.nurse_busy_share[1] - 2520.0 / 4380.0).abs() < 1e-12);
    assert!((day.nurse_busy_share[0] - 1860.0 / 4380.0).abs() < 1e-12);
    assert_eq!(exam.queue_len(), 0);
}

#[test]
fn examination_queues_when_nurses_are_busy() {
    // 登记 60s，一名护士检查 420s：检查室必然排队
    let adm = AdmissionParams {
        service_mean: 60.0,
        arrival_min: 120.0,
        arrival_max: 120.0,
        ..clockwork_admission()
    };
    let (adm, exam, last) = run_lab(adm, clockwork_exam(1), None);
    let day = LabDay::collect(&adm, &exam, last);

    assert_eq!(day.admitted, 30);
    assert_eq!(day.examined, 30);
    // 第一位在 240 开始检查，之后护士一直忙
    assert_eq!(last, SimTime(240.0 + 30.0 * 420.0));
    assert!((day.nurse_busy_share[0] - 240.0 / last.as_secs()).abs() < 1e-12);
}

#[test]
fn more_nurses_shorten_the_overtime() {
    let adm = AdmissionParams {
        service_mean: 60.0,
        arrival_min: 120.0,
        arrival_max: 120.0,
        ..clockwork_admission()
    };
    let (a1, e1, l1) = run_lab(adm.clone(), clockwork_exam(1), None);
    let (a4, e4, l4) = run_lab(adm, clockwork_exam(4), None);
    let one = LabDay::collect(&a1, &e1, l1);
    let four = LabDay::collect(&a4, &e4, l4);

    assert_eq!(one.examined, four.examined);
    assert!(four.overtime < one.overtime);
    assert_eq!(four.nurse_busy_share.len(), 5);
    assert_eq!(e4.nurses(), 4);
}

#[test]
fn seeded_lab_days_are_reproducible() {
    let day = |seed| {
        let (a, e, last) = run_lab(
            AdmissionParams::default(),
            ExaminationParams::default(),
            Some(seed),
        );
        LabDay::collect(&a, &e, last)
    };
    let d = day(11);
    assert_eq!(d, day(11));
    assert_eq!(d.admitted, d.examined);
    assert!(d.overtime >= 0.0);
}

#[test]
fn lab_rejects_invalid_parameters() {
    let err = Examination::new(clockwork_exam(0), None).expect_err("no nurses");
    assert_eq!(err, ModelError::NoServers);

    let err = Admission::new(
        AdmissionParams {
            arrival_min: -1.0,
            ..AdmissionParams::default()
        },
        crate::sim::UnitId(0),
        None,
    )
    .expect_err("negative arrival");
    assert!(matches!(err, ModelError::InvalidArrivalWindow { .. }));
}

#[test]
fn examination_ignores_closing() {
    let mut s: EventSchedule<OfficeAction> = EventSchedule::default();
    let id = s.bind_unit(0);
    let mut exam = Examination::new(clockwork_exam(2), None).expect("examination");
    exam.init(&mut UnitCtx::new(id, &mut s), SimTime::ZERO, SimTime::ZERO);
    assert!(s.is_empty());

    assert!(exam.play(&mut UnitCtx::new(id, &mut s), OfficeAction::Closing));
    assert!(s.is_empty());
    assert_eq!(exam.examined(), 0);
}
