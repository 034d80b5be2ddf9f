//! Integration tests for SalesForge

use std::collections::HashSet;
use std::fs;
use std::io::Write;

use polars::prelude::*;
use salesforge::viz::sales::{regional_sales_by_year, top_products_summary, total_sales_summary};
use salesforge::viz::PERIOD_COLUMN;
use salesforge::{
    clean_data, load_data, prepare_sales, write_html, write_reports, Encoding, Error, Period,
    ReportPaths, Table, Value,
};
use tempfile::{tempdir, NamedTempFile};

const HEADER: &str = "ORDERNUMBER,QUANTITYORDERED,PRICEEACH,ORDERLINENUMBER,SALES,ORDERDATE,STATUS,QTR_ID,MONTH_ID,YEAR_ID,PRODUCTLINE,MSRP,PRODUCTCODE,CUSTOMERNAME,PHONE,ADDRESSLINE1,ADDRESSLINE2,CITY,STATE,POSTALCODE,COUNTRY,TERRITORY,CONTACTLASTNAME,CONTACTFIRSTNAME,DEALSIZE";

/// Create a small sales CSV in ISO-8859-1, shaped like the sample dataset
fn create_sales_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();

    let rows = [
        "10107,30,95.7,2,2871,2/24/2003 0:00,Shipped,1,2,2003,Motorcycles,95,S10_1678,Land of Toys Inc.,2125557818,897 Long Airport Avenue,,NYC,NY,10022,USA,NA,Yu,Kwai,Small",
        "10121,34,81.35,5,2765.9,5/7/2003 0:00,Shipped,2,5,2003,Motorcycles,95,S10_1678,Reims Collectables,26.47.1555,59 rue de l'Abbaye,,Reims,,51100,France,EMEA,Henriot,Paul,Small",
        "10134,41,94.74,2,3884.34,7/1/2003 0:00,Shipped,3,7,2003,Classic Cars,214,S10_1949,Lyon Souveniers,+33 1 46 62 7555,27 rue du Colonel Pierre Avia,,Paris,,75508,France,EMEA,Da Cunha,Daniel,Medium",
        "10145,45,83.26,6,3746.7,8/25/2003 0:00,Shipped,3,8,2003,Classic Cars,214,S10_1949,Toys4GrownUps.com,6265557265,78934 Hillside Dr.,,Pasadena,CA,90003,USA,NA,Young,Julie,Medium",
        "10159,49,100,14,5205.27,10/10/2003 0:00,Shipped,4,10,2003,Planes,118,S18_1662,Corporate Gift Ideas Co.,6505551386,7734 Strong St.,,San Francisco,CA,,USA,NA,Brown,Julie,Medium",
        "10168,36,96.66,1,3479.76,10/28/2003 0:00,Shipped,4,10,2003,Ships,99,S18_3029,Technics Stores Inc.,6505556809,9408 Furth Circle,,Burlingame,CA,94217,USA,NA,Hirano,Juri,Medium",
        "10180,29,86.13,9,2497.77,11/11/2003 0:00,Shipped,4,11,2003,Ships,99,S18_3029,Daedalus Designs Imports,20.16.1555,184 chaussee de Tournai,,Lille,,59000,France,EMEA,Rance,Martine,Small",
        "10188,48,114.84,1,5512.32,11/18/2003 0:00,Shipped,4,11,2003,Trains,100,S18_3259,Euro+ Shopping Channel,(91) 555 94 44,C/ Moralzarzal 86,,Madrid,,28034,Spain,EMEA,Freyre,Diego,Medium",
        "10201,22,98.57,2,2168.54,12/1/2003 0:00,Shipped,4,12,2003,Trains,100,S18_3259,Mini Wheels Co.,6505555787,5557 North Pendale Street,,San Francisco,CA,,USA,NA,Murphy,Julie,Small",
        "10211,41,114.84,14,4708.44,1/15/2004 0:00,Shipped,1,1,2004,Vintage Cars,118,S24_2840,Auto Canal Petit,(1) 47.55.6555,25 rue Lauriston,,Paris,,75016,France,EMEA,Perrier,Dominique,Medium",
        "10223,37,100,1,3965.66,2/20/2004 0:00,Shipped,1,2,2004,Planes,118,S18_1662,Australian Collectors Co.,03 9520 4555,636 St Kilda Road,Level 3,Melbourne,Victoria,3004,Australia,APAC,Ferguson,Peter,Medium",
        // duplicate of the first row
        "10107,30,95.7,2,2871,2/24/2003 0:00,Shipped,1,2,2003,Motorcycles,95,S10_1678,Land of Toys Inc.,2125557818,897 Long Airport Avenue,,NYC,NY,10022,USA,NA,Yu,Kwai,Small",
        // missing sales
        "10237,23,100,7,,4/5/2004 0:00,Shipped,2,4,2004,Ships,99,S18_3029,Vitachrome Inc.,2125551500,2678 Kingston Rd.,Suite 101,NYC,NY,10022,USA,NA,Frick,Michael,Small",
        // padded text
        "10251,28,100,2,3188.64,5/18/2004 0:00,Shipped,2,5,2004,  Vintage   Cars ,118,S24_2840,Tekni Collectables Inc.,2015559350,7476 Moss Rd.,,Newark,NJ,94019,USA,NA,Brown,William,Medium",
    ];
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    // latin-1 byte in a customer name
    file.write_all(b"10263,34,100,2,3676.76,6/28/2004 0:00,Shipped,2,6,2004,Trains,100,S18_3259,Caf\xe9 Gifts,40.32.2555,54 rue Royale,,Nantes,,44000,France,EMEA,Schmitt,Carine,Medium\n")
        .unwrap();

    file
}

#[test]
fn test_prepare_sales_pipeline() {
    let file = create_sales_csv();
    let table = prepare_sales(file.path(), Encoding::Latin1).unwrap();

    // one duplicate and one row with a missing value are removed
    assert_eq!(table.height(), 13);
    // 25 columns, 7 dropped, DISCOUNT_PCT added
    assert_eq!(table.width(), 19);
    for dropped in ["PHONE", "ADDRESSLINE2", "POSTALCODE", "STATE", "TERRITORY"] {
        assert!(!table.has_column(dropped));
    }

    assert!(matches!(table.dtype("ORDERDATE").unwrap(), DataType::Datetime(..)));
    assert!(matches!(table.dtype("DEALSIZE").unwrap(), DataType::Categorical(..)));

    let products = table.values("PRODUCTLINE").unwrap();
    assert!(products.contains(&Value::from("Vintage Cars")));

    let customers = table.values("CUSTOMERNAME").unwrap();
    assert!(customers.contains(&Value::from("Café Gifts")));

    // MSRP 95, price 95.7: negative discount clamps to zero
    let discounts = table.values("DISCOUNT_PCT").unwrap();
    assert_eq!(discounts[0].as_f64(), Some(0.0));
    // MSRP 95, price 81.35
    let expected = (95.0 - 81.35) / 95.0 * 100.0;
    assert!((discounts[1].as_f64().unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_prepare_sales_missing_file() {
    let dir = tempdir().unwrap();
    let result = prepare_sales(dir.path().join("absent.csv"), Encoding::Latin1);
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_missing_markers_dropped_by_clean() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "PRODUCTLINE,STATE").unwrap();
    for row in ["A,NA", "B,N/A", "C,CA", "D,", "E,NaN"] {
        writeln!(file, "{row}").unwrap();
    }

    let table = load_data(file.path(), Encoding::Latin1).unwrap();
    let cleaned = clean_data(table, &[], true, false).unwrap();
    assert_eq!(cleaned.height(), 1);
    assert_eq!(cleaned.values("PRODUCTLINE").unwrap(), vec![Value::from("C")]);
}

#[test]
fn test_clean_scenario() {
    let df = df!(
        "Product" => &[Some("A"), Some("B"), Some("A"), Some("C"), Some("D"), None],
        "Sales" => &[Some(100), Some(200), Some(100), Some(50), None, Some(10)],
        "Date" => &["2025-01-01", "2025-01-02", "2025-01-01", "2025-01-03", "2025-01-04", "2025-01-05"],
        "Region" => &["France", "USA", "France", "Spain", "Italy", "USA"],
        "Postal code" => &["75001", "10001", "75002", "28001", "00100", "10002"],
        "Deal size" => &["Small", "Large", "Small", "Medium", "Small", "Large"],
    )
    .unwrap();

    let cleaned = clean_data(Table::from(df), &["Postal code"], true, true).unwrap();
    assert_eq!(cleaned.width(), 5);
    assert!(!cleaned.has_column("Postal code"));
    // rows 1 and 3 only differed in the postal code
    assert_eq!(cleaned.height(), 3);

    let columns = cleaned.columns().unwrap();
    let mut rows = HashSet::new();
    for i in 0..cleaned.height() {
        let row: Vec<String> = columns.iter().map(|(_, values)| values[i].to_string()).collect();
        assert!(columns.iter().all(|(_, values)| !values[i].is_null()));
        assert!(rows.insert(row), "duplicate row {i}");
    }
}

#[test]
fn test_total_sales_same_month_scenario() {
    let df = df!(
        "Date" => &["2025-03-02", "2025-03-28"],
        "Sales" => &[300, 450],
    )
    .unwrap();

    let summary = total_sales_summary(&Table::from(df), "Date", "Sales", Period::Month).unwrap();
    assert_eq!(summary.height(), 1);
    let total = summary.column("Sales").unwrap().cast(&DataType::Float64).unwrap();
    assert_eq!(total.f64().unwrap().get(0), Some(750.0));
    let label = summary.column(PERIOD_COLUMN).unwrap();
    assert_eq!(label.str().unwrap().get(0), Some("2025-03"));
}

#[test]
fn test_top_products_scenario() {
    let df = df!(
        "Product" => &["A", "B", "C", "D", "E", "F", "G"],
        "Sales" => &[100.0, 200.0, 900.0, 300.0, 400.0, 150.0, 50.0],
        "Date" => &["2025-01-05"; 7],
        "Region" => &["France"; 7],
    )
    .unwrap();

    let summary =
        top_products_summary(&Table::from(df), "Product", "Date", "Region", "Sales", Period::Month)
            .unwrap();
    assert!(summary.height() <= 5);
    assert_eq!(summary.height(), 5);
    assert_eq!(summary.column("Product").unwrap().str().unwrap().get(0), Some("C"));
}

#[test]
fn test_regional_sales_unresolvable_region_scenario() {
    let df = df!(
        "Sales" => &[100.0, 200.0, 300.0],
        "Country" => &["France", "Atlantis", "France"],
        "Year" => &[2003, 2003, 2004],
    )
    .unwrap();

    let charts = regional_sales_by_year(&Table::from(df), "Sales", "Country", "Year").unwrap();
    assert!(charts.bars.trace("Atlantis").is_some());

    let map = &charts.map.traces()[0];
    assert_eq!(map.location_codes(), &["FRA".to_string()]);
    assert_eq!(map.text_values(), &["France".to_string()]);
}

#[test]
fn test_write_html_report() {
    let file = create_sales_csv();
    let table = prepare_sales(file.path(), Encoding::Latin1).unwrap();
    let charts = regional_sales_by_year(&table, "SALES", "COUNTRY", "YEAR_ID").unwrap();

    let dir = tempdir().unwrap();
    let paths = ReportPaths::new(dir.path().join("reports"));
    write_html(&charts.map, paths.regional_sales_map()).unwrap();

    let html = fs::read_to_string(paths.regional_sales_map()).unwrap();
    assert!(html.contains("choropleth"));
    assert!(html.contains("\"AUS\""));
}

#[test]
fn test_write_all_reports() {
    let file = create_sales_csv();
    let table = prepare_sales(file.path(), Encoding::Latin1).unwrap();

    let dir = tempdir().unwrap();
    let paths = ReportPaths::new(dir.path());
    let written = write_reports(&table, &paths).unwrap();

    assert_eq!(written.len(), 14);
    for path in &written {
        assert!(path.exists(), "{} was not written", path.display());
    }
    assert!(paths.price_quantity_raster().exists());
}
