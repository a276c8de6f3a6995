use achot::row::{
    Amount, Field, ReportRow, Totals, aggregate_column, calculate_itog, filter_active_rows,
};

fn row(label: &str, values: &[(Field, i64)]) -> ReportRow {
    values
        .iter()
        .fold(ReportRow::with_label(label), |r, (f, v)| r.set_amount(*f, *v))
}

#[test]
fn itog_subtracts_outbound_from_tovar() {
    let r = row("Un", &[(Field::Tovar, 1000), (Field::Ok, 200), (Field::Pul, 200)]);
    assert_eq!(calculate_itog(&r), 600);

    let r = row(
        "Un",
        &[
            (Field::Tovar, 1000),
            (Field::Rasxod, 50),
            (Field::Vazvirat, 50),
            (Field::Pul, 200),
            (Field::KilikOzi, 100),
        ],
    );
    assert_eq!(calculate_itog(&r), 600);

    let r = row("", &[(Field::Tovar, 1000)]);
    assert_eq!(calculate_itog(&r), 1000);
}

#[test]
fn filter_example_keeps_the_data_row() {
    let rows = vec![row("Data", &[(Field::Tovar, 100)]), ReportRow::empty()];
    let active = filter_active_rows(&rows);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].sabablar, "Data");
}

#[test]
fn itog_can_go_negative() {
    let r = row("Qarz", &[(Field::Rasxod, 300), (Field::KilikOzi, 50)]);
    assert_eq!(calculate_itog(&r), -350);
}

#[test]
fn empty_row_is_inactive() {
    assert!(!ReportRow::empty().is_active());
    assert!(!ReportRow::with_label("   ").is_active());
    assert!(ReportRow::with_label("Un").is_active());
    assert!(row("", &[(Field::Vazvirat, 5)]).is_active());
}

#[test]
fn filter_keeps_labelled_or_numbered_rows() {
    let rows = vec![
        ReportRow::with_label("Un"),
        ReportRow::empty(),
        row("", &[(Field::Ok, 10)]),
        ReportRow::with_label(" "),
    ];
    let active = filter_active_rows(&rows);
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].sabablar, "Un");
    assert_eq!(active[1].value(Field::Ok), 10);
}

#[test]
fn columns_sum_with_unset_as_zero() {
    let rows = vec![
        row("a", &[(Field::Tovar, 1000), (Field::Ok, 100)]),
        row("b", &[(Field::Tovar, 500)]),
        ReportRow::empty(),
    ];
    assert_eq!(aggregate_column(&rows, Field::Tovar), 1500);
    assert_eq!(aggregate_column(&rows, Field::Ok), 100);
    assert_eq!(aggregate_column(&rows, Field::Pul), 0);
    assert_eq!(aggregate_column(&rows, Field::Sabablar), 0);
}

#[test]
fn totals_cover_every_column() {
    let rows = vec![
        row("a", &[(Field::Tovar, 1000), (Field::Ok, 100), (Field::Rasxod, 50)]),
        row("b", &[(Field::Tovar, 500), (Field::Pul, 500)]),
    ];
    let totals = Totals::compute(&rows);
    assert_eq!(totals.row_count, 2);
    assert_eq!(totals.tovar, 1500);
    assert_eq!(totals.column(Field::Ok), 100);
    assert_eq!(totals.column(Field::Rasxod), 50);
    assert_eq!(totals.column(Field::Pul), 500);
    assert_eq!(totals.itog, 850);
}

#[test]
fn amount_parsing() {
    assert_eq!(Amount::parse("1.000").map(|a| a.value()), Some(1000));
    assert_eq!(Amount::parse(""), Some(Amount::unset()));
    assert_eq!(Amount::parse("-5"), None);
    assert_eq!(Amount::parse("12x"), None);
    assert_eq!(Amount::parse("99999999999999999999"), None);
}

#[test]
fn stored_zero_reads_back_unset() {
    assert!(!Amount::from_stored(0).is_set());
    assert_eq!(Amount::from_stored(250).as_str(), "250");
}

#[test]
fn field_order_matches_grid() {
    assert_eq!(Field::first(), Field::Sabablar);
    assert_eq!(Field::last(), Field::KilikOzi);
    assert_eq!(Field::Sabablar.next(), Some(Field::Tovar));
    assert_eq!(Field::KilikOzi.next(), None);
    assert_eq!(Field::Sabablar.prev(), None);
    assert_eq!(Field::from_key("kilik_ozi"), Some(Field::KilikOzi));
    assert_eq!(Field::KilikOzi.caption(), "KILIK O'ZI");
}

#[test]
fn rows_serialize_with_plain_digit_strings() {
    let r = row("Un", &[(Field::Tovar, 1000)]);
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["sabablar"], "Un");
    assert_eq!(json["tovar"], "1000");
    assert_eq!(json["ok"], "");

    let back: ReportRow = serde_json::from_str(r#"{"sabablar":"x","tovar":"5"}"#).unwrap();
    assert_eq!(back.value(Field::Tovar), 5);
    assert!(!back.ok.is_set());
}

#[test]
fn huge_columns_saturate_instead_of_overflowing() {
    let rows = vec![
        row("a", &[(Field::Tovar, i64::MAX)]),
        row("b", &[(Field::Tovar, i64::MAX)]),
    ];
    assert_eq!(aggregate_column(&rows, Field::Tovar), i64::MAX);
    let totals = Totals::compute(&rows);
    assert_eq!(totals.tovar, i64::MAX);
    assert_eq!(totals.itog, i64::MAX);
}

#[test]
fn huge_outbound_saturates_the_itog() {
    let r = row("Qarz", &[(Field::Ok, i64::MAX), (Field::Rasxod, i64::MAX)]);
    assert_eq!(calculate_itog(&r), -i64::MAX);

    let rows = vec![r.clone(), r];
    assert_eq!(Totals::compute(&rows).itog, i64::MIN);
}
